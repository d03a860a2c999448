use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use vibe_core::config::Settings;
use vibe_core::error::{Error, Result};
use vibe_core::traits::{EmbeddingService, VectorIndex};
use vibe_core::types::{
    AttrValue, EmbedInput, Filter, ModalitySpec, Payload, Point, PointRecord, Query, ScoredPoint, Vectors,
};
use vibe_embed::ModalityRouter;
use vibe_hybrid::VibeSearch;
use vibe_vector::InMemoryIndex;

const DIM: usize = 4;

/// Returns the same unit vector for anything; counts calls.
#[derive(Default)]
struct FixedEmbedder {
    calls: AtomicUsize,
}

impl EmbeddingService for FixedEmbedder {
    fn embed(&self, _input: &EmbedInput, _modality: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1.0, 0.0, 0.0, 0.0])
    }
}

struct FailingEmbedder;

impl EmbeddingService for FailingEmbedder {
    fn embed(&self, input: &EmbedInput, _modality: &str) -> Result<Vec<f32>> {
        Err(Error::Embedding(format!("cannot embed {}", input.kind())))
    }
}

/// Canned hits in score order; records every `k` it is asked for and every write.
struct RecordingIndex {
    modalities: Vec<ModalitySpec>,
    hits: Vec<ScoredPoint>,
    requested_k: Mutex<Vec<usize>>,
    writes: Mutex<Vec<Point>>,
    down: bool,
}

impl RecordingIndex {
    fn new(hits: Vec<ScoredPoint>) -> Self {
        Self {
            modalities: vec![ModalitySpec::new("visual", DIM), ModalitySpec::new("audio", DIM)],
            hits,
            requested_k: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            down: false,
        }
    }

    fn unavailable() -> Self { Self { down: true, ..Self::new(Vec::new()) } }

    fn requested(&self) -> Vec<usize> { self.requested_k.lock().unwrap().clone() }

    fn write_count(&self) -> usize { self.writes.lock().unwrap().len() }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    fn modalities(&self) -> &[ModalitySpec] { &self.modalities }

    async fn query(&self, _vector: &[f32], _modality: &str, filter: Option<&Filter>, k: usize) -> Result<Vec<ScoredPoint>> {
        self.requested_k.lock().unwrap().push(k);
        if self.down {
            return Err(Error::IndexUnavailable("connection refused".into()));
        }
        Ok(self
            .hits
            .iter()
            .filter(|h| filter.map_or(true, |f| f.matches(&h.payload)))
            .take(k)
            .cloned()
            .collect())
    }

    async fn upsert(&self, point: Point) -> Result<()> {
        if self.down {
            return Err(Error::IndexUnavailable("connection refused".into()));
        }
        self.writes.lock().unwrap().push(point);
        Ok(())
    }

    async fn count(&self) -> Result<usize> { Ok(self.write_count()) }

    async fn scroll(&self, _limit: usize) -> Result<Vec<PointRecord>> { Ok(Vec::new()) }
}

fn hit(score: f32, attrs: &[(&str, &str)]) -> ScoredPoint {
    let payload = attrs.iter().map(|(k, v)| (k.to_string(), AttrValue::from(*v))).collect();
    ScoredPoint { id: Uuid::new_v4(), score, payload }
}

fn engine(index: Arc<RecordingIndex>) -> VibeSearch {
    VibeSearch::new(Arc::new(FixedEmbedder::default()), index, "visual").expect("engine")
}

#[tokio::test]
async fn pool_is_three_times_the_limit() {
    let index = Arc::new(RecordingIndex::new(vec![hit(0.9, &[])]));
    let search = engine(Arc::clone(&index));
    search.search(&Query::new("cyberpunk").limit(10)).await.expect("search");
    search.search(&Query::new("cyberpunk").limit(1)).await.expect("search");
    assert_eq!(index.requested(), vec![30, 3]);
}

#[tokio::test]
async fn zero_limit_skips_the_index() {
    let embedder = Arc::new(FixedEmbedder::default());
    let index = Arc::new(RecordingIndex::new(vec![hit(0.9, &[])]));
    let search = VibeSearch::new(embedder.clone(), index.clone(), "visual").expect("engine");
    let out = search.search(&Query::new("anything").limit(0)).await.expect("search");
    assert!(out.is_empty());
    assert!(index.requested().is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn negative_limit_is_empty_not_an_error() {
    let embedder = Arc::new(FixedEmbedder::default());
    let index = Arc::new(RecordingIndex::new(vec![hit(0.9, &[])]));
    let search = VibeSearch::new(embedder.clone(), index.clone(), "visual").expect("engine");
    for limit in [-1, i64::MIN] {
        let out = search.search(&Query::new("anything").limit(limit)).await.expect("search");
        assert!(out.is_empty());
    }
    let q: Query = serde_json::from_str(r#"{"text":"neon","limit":-1}"#).expect("parse");
    assert!(search.search(&q).await.expect("search").is_empty());
    assert!(index.requested().is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn soft_match_promotes_second_place() {
    let a = hit(0.90, &[("name", "A"), ("location", "Paris")]);
    let b = hit(0.80, &[("name", "B"), ("location", "London")]);
    let c = hit(0.70, &[("name", "C"), ("location", "Berlin")]);
    let (a_id, b_id) = (a.id, b.id);
    let search = engine(Arc::new(RecordingIndex::new(vec![a, b, c])));

    let out = search.search(&Query::new("moody portrait").prefer("location", "London").limit(2)).await.expect("search");
    assert_eq!(out.iter().map(|c| c.id).collect::<Vec<_>>(), vec![b_id, a_id]);
    assert!((out[0].adjusted_score - 0.95).abs() < 1e-6);
    assert!((out[0].base_score - 0.80).abs() < 1e-6);
    assert_eq!(out[0].boost_trace, vec!["location".to_string()]);
    assert!(out[1].boost_trace.is_empty());
}

#[tokio::test]
async fn boost_reaches_just_outside_the_window() {
    // limit 1 fetches 3; the third hit wins once boosted twice
    let top = hit(0.90, &[]);
    let mid = hit(0.85, &[]);
    let low = hit(0.70, &[("role", "Model"), ("location", "London")]);
    let low_id = low.id;
    let search = engine(Arc::new(RecordingIndex::new(vec![top, mid, low])));
    let q = Query::new("x").prefer("role", "Model").prefer("location", "London").limit(1);
    let out = search.search(&q).await.expect("search");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, low_id);
}

#[tokio::test]
async fn hard_filter_excludes_better_matches() {
    let photographer = hit(0.99, &[("role", "Photographer")]);
    let model = hit(0.50, &[("role", "Model")]);
    let model_id = model.id;
    let search = engine(Arc::new(RecordingIndex::new(vec![photographer, model])));
    let out = search.search(&Query::new("x").must("role", "Model")).await.expect("search");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, model_id);
}

#[tokio::test]
async fn unknown_modality_is_rejected_before_embedding() {
    let embedder = Arc::new(FixedEmbedder::default());
    let index = Arc::new(RecordingIndex::new(Vec::new()));
    let search = VibeSearch::new(embedder.clone(), index.clone(), "visual").expect("engine");
    let err = search.search(&Query::new("x").modality("smell")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidModality(ref m) if m == "smell"));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(index.requested().is_empty());
}

#[tokio::test]
async fn unconfigured_primary_modality_fails_construction() {
    let index = Arc::new(RecordingIndex::new(Vec::new()));
    assert!(matches!(
        VibeSearch::new(Arc::new(FixedEmbedder::default()), index, "smell"),
        Err(Error::InvalidModality(_))
    ));
}

#[tokio::test]
async fn index_failure_propagates() {
    let search = engine(Arc::new(RecordingIndex::unavailable()));
    let err = search.search(&Query::new("x")).await.unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable(_)));
    assert!(!err.is_request_error());
}

#[tokio::test]
async fn embedding_failure_propagates() {
    let index = Arc::new(RecordingIndex::new(vec![hit(0.9, &[])]));
    let search = VibeSearch::new(Arc::new(FailingEmbedder), index.clone(), "visual").expect("engine");
    assert!(matches!(search.search(&Query::new("x")).await, Err(Error::Embedding(_))));
    assert!(index.requested().is_empty());
}

#[tokio::test]
async fn empty_ingest_is_rejected_without_writing() {
    let index = Arc::new(RecordingIndex::new(Vec::new()));
    let search = engine(Arc::clone(&index));
    let err = search.ingest(Payload::new(), Vectors::new()).await.unwrap_err();
    assert!(matches!(err, Error::EmptyIngestVectors));
    assert_eq!(index.write_count(), 0);
}

#[tokio::test]
async fn ingest_mints_fresh_ids() {
    let index = Arc::new(RecordingIndex::new(Vec::new()));
    let search = engine(Arc::clone(&index));
    let mut vectors = Vectors::new();
    vectors.insert("visual".into(), vec![1.0, 0.0, 0.0, 0.0]);
    let mut payload = Payload::new();
    payload.insert("name".into(), "Ada".into());
    let first = search.ingest(payload.clone(), vectors.clone()).await.expect("ingest");
    let second = search.ingest(payload, vectors).await.expect("ingest");
    assert_ne!(first, second);
    assert_eq!(index.write_count(), 2);
}

#[tokio::test]
async fn ingest_rejects_unknown_modality_and_wrong_dim() {
    let index = Arc::new(RecordingIndex::new(Vec::new()));
    let search = engine(Arc::clone(&index));
    let mut vectors = Vectors::new();
    vectors.insert("smell".into(), vec![1.0; DIM]);
    assert!(matches!(search.ingest(Payload::new(), vectors).await, Err(Error::InvalidModality(_))));
    let mut vectors = Vectors::new();
    vectors.insert("visual".into(), vec![1.0; DIM + 1]);
    assert!(matches!(search.ingest(Payload::new(), vectors).await, Err(Error::DimensionMismatch { .. })));
    assert_eq!(index.write_count(), 0);
}

#[tokio::test]
async fn media_ingest_stops_on_embedding_failure() {
    let index = Arc::new(RecordingIndex::new(Vec::new()));
    let search = VibeSearch::new(Arc::new(FailingEmbedder), index.clone(), "visual").expect("engine");
    let media = vec![("visual".to_string(), EmbedInput::Image(vec![1, 2, 3]))];
    assert!(matches!(search.ingest_media(Payload::new(), media).await, Err(Error::Embedding(_))));
    assert_eq!(index.write_count(), 0);
}

#[tokio::test]
async fn end_to_end_with_hashing_embedder() {
    let settings = Settings::default();
    let index = Arc::new(InMemoryIndex::new(settings.index.modalities.clone()));
    let search = VibeSearch::from_settings(Arc::new(ModalityRouter::fake(&settings)), index, &settings).expect("engine");

    let people = [
        ("Ada", "Model", "London", "cyberpunk neon portrait"),
        ("Bo", "Photographer", "London", "cyberpunk neon street"),
        ("Cy", "Model", "Paris", "pastel garden picnic"),
    ];
    for (name, role, location, look) in people {
        let mut payload = Payload::new();
        payload.insert("name".into(), name.into());
        payload.insert("role".into(), role.into());
        payload.insert("location".into(), location.into());
        let media = vec![("visual".to_string(), EmbedInput::Text(look.to_string()))];
        search.ingest_media(payload, media).await.expect("ingest");
    }
    assert_eq!(search.index().count().await.expect("count"), 3);

    let q = Query::new("cyberpunk neon portrait").must("role", "Model").prefer("location", "London").limit(5);
    let out = search.search(&q).await.expect("search");
    assert_eq!(out.len(), 2, "photographer filtered out");
    assert_eq!(out[0].payload["name"], AttrValue::from("Ada"));
    assert_eq!(out[0].boost_trace, vec!["location".to_string()]);
    assert!(out.windows(2).all(|w| w[0].adjusted_score >= w[1].adjusted_score));

    // nothing was ingested into the audio space
    let audio = search.search(&Query::new("cyberpunk").modality("audio")).await.expect("search");
    assert!(audio.is_empty());
}
