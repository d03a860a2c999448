use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Arc;

use vibe_core::config::{expand_path, EmbedBackend, Settings};
use vibe_core::error::Error;
use vibe_core::traits::{Embedder, EmbeddingService};
use vibe_core::types::EmbedInput;

use crate::clip::{resolve_model_dir, ClipEmbedder, CLIP_DIM};
use crate::hash::HashEmbedder;

/// Dispatches `embed(input, modality)` to the embedder registered for that space.
#[derive(Default, Clone)]
pub struct ModalityRouter {
    backends: HashMap<String, Arc<dyn Embedder>>,
}

impl ModalityRouter {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, modality: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        self.backends.insert(modality.into(), embedder);
        self
    }

    /// Hash embedders for every configured modality.
    pub fn fake(settings: &Settings) -> Self {
        settings.index.modalities.iter().fold(Self::new(), |router, m| {
            router.with(m.name.clone(), Arc::new(HashEmbedder::for_modality(m.dim, &m.name)))
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if use_fake_embeddings() {
            tracing::info!("APP_USE_FAKE_EMBEDDINGS set; hashing embedder for all modalities");
            return Ok(Self::fake(settings));
        }
        let mut router = Self::new();
        for m in &settings.index.modalities {
            let embedder: Arc<dyn Embedder> = match settings.embedding.backend_for(&m.name) {
                EmbedBackend::Hash => Arc::new(HashEmbedder::for_modality(m.dim, &m.name)),
                EmbedBackend::Clip => {
                    if m.dim != CLIP_DIM {
                        return Err(anyhow!("modality '{}' has dim {} but CLIP produces {}", m.name, m.dim, CLIP_DIM));
                    }
                    let configured = settings.embedding.model_dir.as_deref().map(expand_path);
                    let dir = resolve_model_dir(configured.as_deref())?;
                    Arc::new(ClipEmbedder::new(&dir)?)
                }
            };
            tracing::debug!(modality = %m.name, dim = m.dim, "embedder registered");
            router = router.with(m.name.clone(), embedder);
        }
        Ok(router)
    }
}

impl EmbeddingService for ModalityRouter {
    fn embed(&self, input: &EmbedInput, modality: &str) -> vibe_core::Result<Vec<f32>> {
        let embedder = self
            .backends
            .get(modality)
            .ok_or_else(|| Error::InvalidModality(modality.to_string()))?;
        let v = embedder.embed(input)?;
        if v.len() != embedder.dim() {
            return Err(Error::Embedding(format!(
                "'{}' embedder returned {} dims, expected {}",
                modality,
                v.len(),
                embedder.dim()
            )));
        }
        Ok(v)
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}
