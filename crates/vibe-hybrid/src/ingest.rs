use std::sync::Arc;
use uuid::Uuid;

use vibe_core::error::{Error, Result};
use vibe_core::traits::VectorIndex;
use vibe_core::types::{Payload, Point, PointId, Vectors};
use vibe_core::vector::check_vector;

/// Stores a new entity. Every call mints a fresh id; nothing is ever overwritten.
pub struct IngestPipeline {
    index: Arc<dyn VectorIndex>,
}

impl IngestPipeline {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self { Self { index } }

    /// Validates before writing, so a rejected call leaves the index untouched.
    pub async fn ingest(&self, payload: Payload, vectors: Vectors) -> Result<PointId> {
        if vectors.is_empty() {
            return Err(Error::EmptyIngestVectors);
        }
        for (modality, v) in &vectors {
            check_vector(self.index.modalities(), modality, v)?;
        }
        let id = Uuid::new_v4();
        let mut modalities: Vec<&str> = vectors.keys().map(String::as_str).collect();
        modalities.sort_unstable();
        let modalities = modalities.join(",");
        self.index.upsert(Point { id, vectors, payload }).await.map_err(|e| {
            tracing::warn!(error = %e, %id, "vector index write failed");
            e
        })?;
        tracing::info!(%id, modalities = %modalities, "point ingested");
        Ok(id)
    }
}
