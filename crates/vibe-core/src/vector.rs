use crate::error::{Error, Result};
use crate::types::ModalitySpec;

pub fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

/// Scale `v` to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = dot(v, v).sqrt();
    if norm > 1e-12 { for x in v.iter_mut() { *x /= norm; } }
}

pub fn lookup<'a>(specs: &'a [ModalitySpec], modality: &str) -> Result<&'a ModalitySpec> {
    specs
        .iter()
        .find(|s| s.name == modality)
        .ok_or_else(|| Error::InvalidModality(modality.to_string()))
}

/// Reject vectors for unknown modalities or of the wrong length.
pub fn check_vector(specs: &[ModalitySpec], modality: &str, v: &[f32]) -> Result<()> {
    let spec = lookup(specs, modality)?;
    if v.len() != spec.dim {
        return Err(Error::DimensionMismatch { modality: modality.to_string(), expected: spec.dim, actual: v.len() });
    }
    Ok(())
}
