//! ANN index boundary and exact-scan reference implementation

use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Ordering;

/// Metric reported by an index; decides how raw scores are normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMetric {
    /// Raw score is already a similarity in [-1, 1]
    Cosine,
    /// Raw score is an unbounded dot product treated as a similarity
    InnerProduct,
    /// Raw score is a distance; smaller is closer
    L2,
}

/// One nearest-neighbour hit
#[derive(Debug, Clone)]
pub struct AnnHit {
    pub id: String,
    pub raw_score: f32,
    /// Indexed text, when the index stores it alongside the vector. Used
    /// to materialize candidates for hits with no persisted fragment.
    pub content: Option<String>,
}

/// Opaque nearest-neighbour index. The engine tolerates an index that is
/// unexpectedly empty or absent; recovery (rebuild-empty) is the
/// implementation's concern.
#[async_trait]
pub trait AnnIndex: Send + Sync {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<AnnHit>>;

    async fn add(&self, id: &str, vector: Vec<f32>, content: Option<String>) -> Result<()>;

    async fn persist(&self) -> Result<()>;

    async fn load(&self) -> Result<()>;

    fn metric(&self) -> SimilarityMetric;
}

/// Exact cosine scan over an in-memory map. Reference implementation for
/// tests and small corpora.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: DashMap<String, (Vec<f32>, Option<String>)>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl AnnIndex for InMemoryIndex {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<AnnHit>> {
        let mut hits: Vec<AnnHit> = self
            .entries
            .iter()
            .map(|entry| AnnHit {
                id: entry.key().clone(),
                raw_score: Self::cosine(vector, &entry.value().0),
                content: entry.value().1.clone(),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.raw_score
                .partial_cmp(&a.raw_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn add(&self, id: &str, vector: Vec<f32>, content: Option<String>) -> Result<()> {
        self.entries.insert(id.to_string(), (vector, content));
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        Ok(())
    }

    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::Cosine
    }
}
