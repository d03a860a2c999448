//! Collaborator contracts. The ranking core only ever talks to these.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EmbedInput, Filter, ModalitySpec, Point, PointRecord, ScoredPoint};

/// One embedding model serving a single vector space.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// Returns an L2-normalized vector of length `dim()`.
    fn embed(&self, input: &EmbedInput) -> Result<Vec<f32>>;
}

/// Maps raw input into the named vector space. May block on model inference.
pub trait EmbeddingService: Send + Sync {
    fn embed(&self, input: &EmbedInput, modality: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Vector spaces this index was created with.
    fn modalities(&self) -> &[ModalitySpec];

    /// Nearest neighbours of `vector` in `modality`, best first, at most `k`.
    async fn query(
        &self,
        vector: &[f32],
        modality: &str,
        filter: Option<&Filter>,
        k: usize,
    ) -> Result<Vec<ScoredPoint>>;

    async fn upsert(&self, point: Point) -> Result<()>;

    async fn count(&self) -> Result<usize>;

    /// First `limit` stored points, without vectors.
    async fn scroll(&self, limit: usize) -> Result<Vec<PointRecord>>;
}
