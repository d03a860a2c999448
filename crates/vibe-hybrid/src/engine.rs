use std::sync::Arc;

use vibe_core::config::Settings;
use vibe_core::error::{Error, Result};
use vibe_core::traits::{EmbeddingService, VectorIndex};
use vibe_core::types::{Candidate, Conditions, EmbedInput, Payload, PointId, Query, Vectors};
use vibe_core::vector::lookup;

use crate::boost::BoostEngine;
use crate::filter::build_filter;
use crate::ingest::IngestPipeline;
use crate::rank::rank;
use crate::retrieve::PoolRetriever;

/// Vibe search over injected collaborators.
///
/// Holds no mutable state; one instance serves any number of concurrent calls.
/// A search runs embed → filter → retrieve → boost → rank, strictly in order.
pub struct VibeSearch {
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    retriever: PoolRetriever,
    booster: BoostEngine,
    ingest: IngestPipeline,
    primary_modality: String,
}

impl VibeSearch {
    pub fn new(embedder: Arc<dyn EmbeddingService>, index: Arc<dyn VectorIndex>, primary_modality: impl Into<String>) -> Result<Self> {
        let primary_modality = primary_modality.into();
        lookup(index.modalities(), &primary_modality)?;
        Ok(Self {
            retriever: PoolRetriever::new(Arc::clone(&index)),
            booster: BoostEngine::default(),
            ingest: IngestPipeline::new(Arc::clone(&index)),
            embedder,
            index,
            primary_modality,
        })
    }

    /// Like [`VibeSearch::new`] with overfetch and boost strength taken from `settings`.
    pub fn from_settings(embedder: Arc<dyn EmbeddingService>, index: Arc<dyn VectorIndex>, settings: &Settings) -> Result<Self> {
        let mut engine = Self::new(embedder, Arc::clone(&index), settings.index.primary_modality.clone())?;
        engine.retriever = PoolRetriever::with_factor(index, settings.search.overfetch_factor);
        engine.booster = BoostEngine::new(settings.search.boost_strength);
        tracing::debug!(
            primary = %engine.primary_modality,
            overfetch = settings.search.overfetch_factor,
            boost = engine.booster.strength(),
            "engine configured"
        );
        Ok(engine)
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> { &self.index }

    pub fn primary_modality(&self) -> &str { &self.primary_modality }

    /// `None` selects the primary modality; anything else must be configured on the index.
    pub fn resolve_modality(&self, requested: Option<&str>) -> Result<String> {
        let name = requested.unwrap_or(&self.primary_modality);
        Ok(lookup(self.index.modalities(), name)?.name.clone())
    }

    /// Run the embedding call on the blocking pool; model inference is CPU-bound.
    pub async fn embed(&self, input: EmbedInput, modality: &str) -> Result<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let modality = modality.to_string();
        tokio::task::spawn_blocking(move || embedder.embed(&input, &modality))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
    }

    pub async fn search(&self, query: &Query) -> Result<Vec<Candidate>> {
        let modality = self.resolve_modality(query.modality.as_deref())?;
        tracing::debug!(
            text = %query.text,
            modality = %modality,
            hard = ?query.hard_filters,
            soft = ?query.soft_filters,
            limit = query.limit,
            "vibe search"
        );
        let limit = query.result_limit();
        if limit == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embed(EmbedInput::Text(query.text.clone()), &modality).await?;
        self.search_vector(&vector, &modality, &query.hard_filters, &query.soft_filters, limit).await
    }

    /// Everything after embedding: filter, retrieve, boost, rank.
    pub async fn search_vector(
        &self,
        vector: &[f32],
        modality: &str,
        hard_filters: &Conditions,
        soft_filters: &Conditions,
        limit: usize,
    ) -> Result<Vec<Candidate>> {
        let filter = build_filter(hard_filters);
        let pool = self.retriever.retrieve(vector, modality, filter.as_ref(), limit).await?;
        let pool = self.booster.boost(pool, soft_filters);
        let ranked = rank(pool, limit);
        tracing::debug!(returned = ranked.len(), "search ranked");
        Ok(ranked)
    }

    pub async fn ingest(&self, payload: Payload, vectors: Vectors) -> Result<PointId> {
        self.ingest.ingest(payload, vectors).await
    }

    /// Embed each `(modality, input)` into its own space, then ingest the result.
    ///
    /// An embedding failure aborts the call before any write.
    pub async fn ingest_media(&self, payload: Payload, media: Vec<(String, EmbedInput)>) -> Result<PointId> {
        let mut vectors = Vectors::new();
        for (modality, input) in media {
            let modality = self.resolve_modality(Some(&modality))?;
            let v = self.embed(input, &modality).await?;
            vectors.insert(modality, v);
        }
        self.ingest(payload, vectors).await
    }
}
