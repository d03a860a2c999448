use std::sync::Arc;

use vibe_core::constants::OVERFETCH_FACTOR;
use vibe_core::error::Result;
use vibe_core::traits::VectorIndex;
use vibe_core::types::{Candidate, Filter};

/// Fetches an over-sized candidate pool so boosting can promote matches
/// ranked just outside the requested window.
pub struct PoolRetriever {
    index: Arc<dyn VectorIndex>,
    overfetch_factor: usize,
}

impl PoolRetriever {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self { Self::with_factor(index, OVERFETCH_FACTOR) }

    pub fn with_factor(index: Arc<dyn VectorIndex>, overfetch_factor: usize) -> Self {
        Self { index, overfetch_factor: overfetch_factor.max(1) }
    }

    pub fn pool_size(&self, limit: usize) -> usize { limit.saturating_mul(self.overfetch_factor) }

    /// One index query, no retries. Fewer hits than the pool size is not an error.
    pub async fn retrieve(&self, query_vector: &[f32], modality: &str, filter: Option<&Filter>, limit: usize) -> Result<Vec<Candidate>> {
        let k = self.pool_size(limit);
        if k == 0 {
            return Ok(Vec::new());
        }
        let hits = self.index.query(query_vector, modality, filter, k).await.map_err(|e| {
            tracing::warn!(error = %e, modality, k, "vector index query failed");
            e
        })?;
        tracing::debug!(requested = k, returned = hits.len(), modality, "candidate pool retrieved");
        Ok(hits.into_iter().map(Candidate::from).collect())
    }
}
