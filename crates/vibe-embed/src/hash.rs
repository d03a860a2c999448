//! Deterministic feature-hashing embedder.
//!
//! Needs no model files, so it backs development, tests and any modality
//! without a real model. Vectors are stable across runs for the same input,
//! seed and dimension. They carry no cross-modal semantics.

use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use vibe_core::error::{Error, Result};
use vibe_core::traits::Embedder;
use vibe_core::types::EmbedInput;
use vibe_core::vector::l2_normalize;

const BYTE_SHINGLE: usize = 64;

pub struct HashEmbedder { dim: usize, seed: u64 }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, seed: 0 } }

    /// Distinct seeds keep different modalities in unrelated spaces.
    pub fn with_seed(dim: usize, seed: u64) -> Self { Self { dim, seed } }

    pub fn for_modality(dim: usize, modality: &str) -> Self {
        let mut hasher = XxHash64::with_seed(0);
        modality.hash(&mut hasher);
        Self::with_seed(dim, hasher.finish())
    }

    fn accumulate<T: Hash>(&self, v: &mut [f32], i: usize, token: T) {
        let mut hasher = XxHash64::with_seed(self.seed);
        token.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h as usize) % self.dim;
        let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        v[idx] += val + (i as f32 % 3.0) * 0.01;
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, input: &EmbedInput) -> Result<Vec<f32>> {
        if self.dim == 0 {
            return Err(Error::Embedding("hashing embedder has zero dimensions".into()));
        }
        let mut v = vec![0f32; self.dim];
        match input {
            EmbedInput::Text(text) => {
                for (i, token) in text.split_whitespace().enumerate() { self.accumulate(&mut v, i, token); }
            }
            EmbedInput::Image(bytes) | EmbedInput::Audio(bytes) => {
                for (i, chunk) in bytes.chunks(BYTE_SHINGLE).enumerate() { self.accumulate(&mut v, i, chunk); }
            }
        }
        if v.iter().all(|x| *x == 0.0) {
            return Err(Error::Embedding(format!("empty {} input", input.kind())));
        }
        l2_normalize(&mut v);
        Ok(v)
    }
}
