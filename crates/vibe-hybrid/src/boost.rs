use vibe_core::constants::BOOST_STRENGTH;
use vibe_core::types::{Candidate, Conditions};

/// Additive soft-preference scoring. Uncapped: enough matches can lift a weak
/// similarity above a strong unboosted one.
#[derive(Debug, Clone, Copy)]
pub struct BoostEngine {
    strength: f32,
}

impl Default for BoostEngine {
    fn default() -> Self { Self { strength: BOOST_STRENGTH } }
}

impl BoostEngine {
    pub fn new(strength: f32) -> Self { Self { strength } }

    pub fn strength(&self) -> f32 { self.strength }

    /// Adds `strength` for every `(k, v)` whose payload value is exactly the string `v`.
    /// List-valued attributes never match. Touches only `adjusted_score` and `boost_trace`.
    pub fn boost_one(&self, candidate: &mut Candidate, soft_filters: &Conditions) {
        for (key, wanted) in soft_filters {
            let hit = candidate.payload.get(key).and_then(|v| v.as_text()) == Some(wanted.as_str());
            if hit {
                candidate.adjusted_score += self.strength;
                candidate.boost_trace.push(key.clone());
            }
        }
    }

    pub fn boost(&self, mut candidates: Vec<Candidate>, soft_filters: &Conditions) -> Vec<Candidate> {
        if soft_filters.is_empty() {
            return candidates;
        }
        for c in &mut candidates {
            self.boost_one(c, soft_filters);
        }
        let boosted = candidates.iter().filter(|c| !c.boost_trace.is_empty()).count();
        tracing::debug!(pool = candidates.len(), boosted, "soft preferences applied");
        candidates
    }
}
