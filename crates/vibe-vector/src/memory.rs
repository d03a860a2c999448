//! Exact, in-process vector index.
//!
//! Brute-force dot product over every stored vector of the requested
//! modality. Points are kept in insertion order, which is also the
//! tie-break between equal scores. Nothing is persisted.

use async_trait::async_trait;
use tokio::sync::RwLock;

use vibe_core::error::Result;
use vibe_core::traits::VectorIndex;
use vibe_core::types::{Filter, ModalitySpec, Point, PointRecord, ScoredPoint};
use vibe_core::vector::{check_vector, dot};

pub struct InMemoryIndex {
    modalities: Vec<ModalitySpec>,
    points: RwLock<Vec<Point>>,
}

impl InMemoryIndex {
    pub fn new(modalities: Vec<ModalitySpec>) -> Self {
        Self { modalities, points: RwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn modalities(&self) -> &[ModalitySpec] { &self.modalities }

    async fn query(&self, vector: &[f32], modality: &str, filter: Option<&Filter>, k: usize) -> Result<Vec<ScoredPoint>> {
        check_vector(&self.modalities, modality, vector)?;
        let points = self.points.read().await;
        let mut hits: Vec<ScoredPoint> = points
            .iter()
            .filter(|p| filter.map_or(true, |f| f.matches(&p.payload)))
            .filter_map(|p| {
                p.vectors.get(modality).map(|v| ScoredPoint { id: p.id, score: dot(vector, v), payload: p.payload.clone() })
            })
            .collect();
        // stable: equal scores keep insertion order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn upsert(&self, point: Point) -> Result<()> {
        for (modality, v) in &point.vectors {
            check_vector(&self.modalities, modality, v)?;
        }
        let mut points = self.points.write().await;
        match points.iter_mut().find(|p| p.id == point.id) {
            Some(existing) => *existing = point,
            None => points.push(point),
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> { Ok(self.points.read().await.len()) }

    async fn scroll(&self, limit: usize) -> Result<Vec<PointRecord>> {
        let points = self.points.read().await;
        Ok(points
            .iter()
            .take(limit)
            .map(|p| {
                let mut modalities: Vec<String> = p.vectors.keys().cloned().collect();
                modalities.sort();
                PointRecord { id: p.id, modalities, payload: p.payload.clone() }
            })
            .collect())
    }
}
