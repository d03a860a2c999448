use anyhow::{Result, anyhow};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Encode one text as a `[1, T]` id tensor, `T <= max_len`.
///
/// CLIP pools at the highest token id (end-of-text), so over-long inputs are
/// cut and the last kept position is overwritten with `eos_id`. No padding.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, eos_id: u32, device: &Device) -> Result<Tensor> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    if ids.is_empty() { return Err(anyhow!("Tokenizer produced no tokens")); }
    if ids.len() > max_len { ids.truncate(max_len); if let Some(last) = ids.last_mut() { *last = eos_id; } }
    Ok(Tensor::new(ids.as_slice(), device)?.unsqueeze(0)?)
}
