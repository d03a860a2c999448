//! Layered configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_SEARCH__DEFAULT_LIMIT=20`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{AUDIO, BOOST_STRENGTH, DEFAULT_DIM, DEFAULT_LIMIT, OVERFETCH_FACTOR, VISUAL};
use crate::error::{Error, Result};
use crate::types::ModalitySpec;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> { Self::load_in(Path::new(".")) }

    /// Like [`Config::load`] but resolves the TOML files against `base`.
    pub fn load_in(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed, validated settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexSettings,
    pub search: SearchSettings,
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    Memory,
    Lance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub backend: IndexBackend,
    pub uri: String,
    pub table: String,
    pub modalities: Vec<ModalitySpec>,
    pub primary_modality: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Memory,
            uri: "data/lancedb".to_string(),
            table: "upstage".to_string(),
            modalities: vec![ModalitySpec::new(VISUAL, DEFAULT_DIM), ModalitySpec::new(AUDIO, DEFAULT_DIM)],
            primary_modality: VISUAL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub overfetch_factor: usize,
    pub boost_strength: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { default_limit: DEFAULT_LIMIT, overfetch_factor: OVERFETCH_FACTOR, boost_strength: BOOST_STRENGTH }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedBackend {
    /// Deterministic feature hashing; no model files needed.
    Hash,
    /// CLIP ViT-B/32 via candle. Visual space only.
    Clip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    /// Modality name → backend. Modalities not listed use `Hash`.
    pub backends: HashMap<String, EmbedBackend>,
}

impl EmbeddingSettings {
    pub fn backend_for(&self, modality: &str) -> EmbedBackend {
        self.backends.get(modality).copied().unwrap_or(EmbedBackend::Hash)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let idx = &self.index;
        if idx.modalities.is_empty() {
            return Err(Error::InvalidConfig("index.modalities must not be empty".into()));
        }
        for (i, m) in idx.modalities.iter().enumerate() {
            if m.name.is_empty() || m.dim == 0 {
                return Err(Error::InvalidConfig(format!("modality #{i} needs a name and a non-zero dim")));
            }
            if idx.modalities[..i].iter().any(|o| o.name == m.name) {
                return Err(Error::InvalidConfig(format!("modality '{}' declared twice", m.name)));
            }
        }
        if !idx.modalities.iter().any(|m| m.name == idx.primary_modality) {
            return Err(Error::InvalidConfig(format!(
                "primary modality '{}' is not among index.modalities",
                idx.primary_modality
            )));
        }
        for (name, backend) in &self.embedding.backends {
            if !idx.modalities.iter().any(|m| &m.name == name) {
                return Err(Error::InvalidConfig(format!("embedding backend set for unknown modality '{name}'")));
            }
            if *backend == EmbedBackend::Clip && name != VISUAL {
                return Err(Error::InvalidConfig(format!("clip backend only serves '{VISUAL}', not '{name}'")));
            }
        }
        if self.search.overfetch_factor == 0 {
            return Err(Error::InvalidConfig("search.overfetch_factor must be >= 1".into()));
        }
        if !self.search.boost_strength.is_finite() {
            return Err(Error::InvalidConfig("search.boost_strength must be finite".into()));
        }
        Ok(())
    }

    pub fn modality_names(&self) -> Vec<String> {
        self.index.modalities.iter().map(|m| m.name.clone()).collect()
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
