//! vibe-embed
//!
//! Embedding Service implementations. [`ModalityRouter`] maps each configured
//! vector space to one [`Embedder`](vibe_core::traits::Embedder): CLIP (candle)
//! for the visual space or the deterministic [`HashEmbedder`] elsewhere.

pub mod clip;
pub mod device;
pub mod hash;
pub mod router;
pub mod tokenize;

pub use clip::ClipEmbedder;
pub use hash::HashEmbedder;
pub use router::{use_fake_embeddings, ModalityRouter};
