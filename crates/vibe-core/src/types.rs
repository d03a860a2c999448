//! Domain types shared by the embedding, index and ranking crates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::constants::DEFAULT_LIMIT;

pub type PointId = Uuid;
pub type Payload = HashMap<String, AttrValue>;
pub type Vectors = HashMap<String, Vec<f32>>;

/// Attribute → value constraints. Ordered so boost traces are reproducible.
pub type Conditions = BTreeMap<String, String>;

/// A payload attribute: a plain keyword or a multi-valued keyword list (e.g. tags).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    List(Vec<String>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::List(_) => None,
        }
    }

    /// Keyword-index semantics: a list satisfies `value` when any element equals it.
    pub fn satisfies(&self, value: &str) -> bool {
        match self {
            AttrValue::Text(s) => s == value,
            AttrValue::List(items) => items.iter().any(|s| s == value),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self { AttrValue::Text(s.to_string()) }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self { AttrValue::Text(s) }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self { AttrValue::List(v) }
}

/// A named vector space and its fixed dimensionality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalitySpec {
    pub name: String,
    pub dim: usize,
}

impl ModalitySpec {
    pub fn new(name: impl Into<String>, dim: usize) -> Self { Self { name: name.into(), dim } }
}

/// One stored entity.
///
/// - `id`: assigned at ingest, never reused
/// - `vectors`: modality name → unit-length vector of that modality's dimension
/// - `payload`: free-form attributes; keys differ between points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub vectors: Vectors,
    pub payload: Payload,
}

/// A similarity hit as returned by a vector index. Higher `score` is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    pub payload: Payload,
}

/// Stored point without its vectors, used for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    pub modalities: Vec<String>,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub key: String,
    pub value: String,
}

/// Conjunctive exact-match predicate over a point's payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub must: Vec<FieldCondition>,
}

impl Filter {
    pub fn matches(&self, payload: &Payload) -> bool {
        self.must
            .iter()
            .all(|c| payload.get(&c.key).is_some_and(|v| v.satisfies(&c.value)))
    }
}

/// Per-search working record. Only `adjusted_score` and `boost_trace` change after retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: PointId,
    pub base_score: f32,
    #[serde(rename = "score")]
    pub adjusted_score: f32,
    pub payload: Payload,
    pub boost_trace: Vec<String>,
}

impl From<ScoredPoint> for Candidate {
    fn from(hit: ScoredPoint) -> Self {
        Self {
            id: hit.id,
            base_score: hit.score,
            adjusted_score: hit.score,
            payload: hit.payload,
            boost_trace: Vec::new(),
        }
    }
}

/// A vibe search request. `modality: None` means the index's primary modality.
///
/// `limit` is signed as received; zero or negative asks for nothing and
/// yields an empty result rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default)]
    pub modality: Option<String>,
    #[serde(default)]
    pub hard_filters: Conditions,
    #[serde(default)]
    pub soft_filters: Conditions,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 { DEFAULT_LIMIT as i64 }

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            modality: None,
            hard_filters: Conditions::new(),
            soft_filters: Conditions::new(),
            limit: default_limit(),
        }
    }

    pub fn modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = Some(modality.into());
        self
    }

    pub fn must(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hard_filters.insert(key.into(), value.into());
        self
    }

    pub fn prefer(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.soft_filters.insert(key.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// `limit` clamped to a result count; non-positive becomes 0.
    pub fn result_limit(&self) -> usize { usize::try_from(self.limit).unwrap_or(0) }
}

/// Raw input handed to the embedding service.
#[derive(Debug, Clone)]
pub enum EmbedInput {
    Text(String),
    /// Encoded image bytes (PNG, JPEG, ...).
    Image(Vec<u8>),
    /// Encoded audio bytes.
    Audio(Vec<u8>),
}

impl EmbedInput {
    pub fn kind(&self) -> &'static str {
        match self {
            EmbedInput::Text(_) => "text",
            EmbedInput::Image(_) => "image",
            EmbedInput::Audio(_) => "audio",
        }
    }
}
