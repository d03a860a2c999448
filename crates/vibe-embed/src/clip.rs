//! CLIP ViT-B/32 embedder for the visual space.
//!
//! Text and images land in the same 512-d space, so a text query can retrieve
//! images. The model directory must contain `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin` (Hugging Face layout).

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{self, ClipConfig, ClipModel};
use tokenizers::Tokenizer;

use vibe_core::error::Error;
use vibe_core::traits::Embedder;
use vibe_core::types::EmbedInput;

use crate::device::select_device;
use crate::tokenize::tokenize_on_device;

pub const CLIP_DIM: usize = 512;
const EOS_TOKEN: &str = "<|endoftext|>";

pub struct ClipEmbedder {
    model: ClipModel,
    tokenizer: Tokenizer,
    config: ClipConfig,
    eos_id: u32,
    device: Device,
}

impl ClipEmbedder {
    pub fn new(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading CLIP model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let eos_id = tokenizer
            .token_to_id(EOS_TOKEN)
            .ok_or_else(|| anyhow!("tokenizer has no {} token", EOS_TOKEN))?;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let config = ClipConfig::vit_base_patch32();
        let model = ClipModel::new(vb, &config)?;
        tracing::info!("CLIP model loaded");
        Ok(Self { model, tokenizer, config, eos_id, device })
    }

    fn embed_text(&self, text: &str) -> Result<Tensor> {
        let max_len = self.config.text_config.max_position_embeddings;
        let ids = tokenize_on_device(&self.tokenizer, text, max_len, self.eos_id, &self.device)?;
        Ok(self.model.get_text_features(&ids)?)
    }

    fn embed_image(&self, bytes: &[u8]) -> Result<Tensor> {
        let size = self.config.image_size;
        let img = image::load_from_memory(bytes)?
            .resize_to_fill(size as u32, size as u32, image::imageops::FilterType::Triangle)
            .to_rgb8()
            .into_raw();
        let pixels = Tensor::from_vec(img, (size, size, 3), &Device::Cpu)?
            .permute((2, 0, 1))?
            .to_dtype(DType::F32)?
            .affine(2. / 255., -1.)?
            .unsqueeze(0)?
            .to_device(&self.device)?;
        Ok(self.model.get_image_features(&pixels)?)
    }

    fn to_unit_vec(features: &Tensor) -> Result<Vec<f32>> {
        let normed = clip::div_l2_norm(features)?;
        Ok(normed.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?)
    }
}

impl Embedder for ClipEmbedder {
    fn dim(&self) -> usize { CLIP_DIM }

    fn embed(&self, input: &EmbedInput) -> vibe_core::Result<Vec<f32>> {
        let features = match input {
            EmbedInput::Text(text) => self.embed_text(text),
            EmbedInput::Image(bytes) => self.embed_image(bytes),
            EmbedInput::Audio(_) => return Err(Error::Embedding("CLIP cannot embed audio".into())),
        };
        features
            .and_then(|f| Self::to_unit_vec(&f))
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let bin = model_dir.join("pytorch_model.bin");
    if bin.exists() {
        return Ok(candle_core::pickle::read_all(&bin)?.into_iter().collect());
    }
    Err(anyhow!("no CLIP weights under {}", model_dir.display()))
}

/// Locate the CLIP model directory: explicit setting, then env, then conventional paths.
pub fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = configured { if p.exists() { return Ok(p.to_path_buf()); } }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { tracing::info!("using APP_MODEL_DIR: {}", p.display()); return Ok(p); } }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { tracing::info!("using MODEL_DIR: {}", p.display()); return Ok(p); } }
    let root = Path::new("../models/clip-vit-base-patch32"); if root.exists() { return Ok(root.to_path_buf()); }
    let local = Path::new("models/clip-vit-base-patch32"); if local.exists() { return Ok(local.to_path_buf()); }
    Err(anyhow!("Could not locate CLIP model directory"))
}
