//! Fixed retrieval constants. `Settings` may override the first two at start-up.

/// Candidate pool size is `limit * OVERFETCH_FACTOR`.
pub const OVERFETCH_FACTOR: usize = 3;

/// Additive score increment per matching soft-filter key.
pub const BOOST_STRENGTH: f32 = 0.15;

pub const DEFAULT_LIMIT: usize = 10;

pub const VISUAL: &str = "visual";
pub const AUDIO: &str = "audio";

/// Dimensionality of both CLIP ViT-B/32 and CLAP embeddings.
pub const DEFAULT_DIM: usize = 512;
