use vibe_core::types::Candidate;

/// Order by `adjusted_score` descending and keep the first `limit`.
///
/// The sort is stable, so equal scores keep the index's order.
pub fn rank(mut candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    if limit == 0 {
        return Vec::new();
    }
    candidates.sort_by(|a, b| b.adjusted_score.total_cmp(&a.adjusted_score));
    candidates.truncate(limit);
    candidates
}
