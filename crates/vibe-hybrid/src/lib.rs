//! vibe-hybrid
//!
//! Vibe search: a vector similarity pool, narrowed by hard filters and
//! re-ordered by soft preference boosts. [`VibeSearch`] wires the stages
//! together over any [`EmbeddingService`](vibe_core::traits::EmbeddingService)
//! and [`VectorIndex`](vibe_core::traits::VectorIndex).

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use vibe_core::config::Settings;
use vibe_embed::ModalityRouter;
use vibe_vector::open_index;

pub mod boost;
pub mod engine;
pub mod filter;
pub mod ingest;
pub mod rank;
pub mod retrieve;

pub use boost::BoostEngine;
pub use engine::VibeSearch;
pub use filter::build_filter;
pub use ingest::IngestPipeline;
pub use rank::rank;
pub use retrieve::PoolRetriever;

/// Build the engine from validated settings: embedders per modality, then the configured index.
pub async fn open_engine(settings: &Settings, base: &Path) -> Result<VibeSearch> {
    let embedder = Arc::new(ModalityRouter::from_settings(settings)?);
    let index = open_index(settings, base).await?;
    Ok(VibeSearch::from_settings(embedder, index, settings)?)
}
