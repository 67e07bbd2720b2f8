//! Fusion adapter: normalizes ANN hits onto the symbolic score scale
//!
//! Normalization policy: raw scores are mapped into [0, 1] per metric
//! (cosine and inner-product scores are clamped; L2 distances are min-max
//! normalized against the batch and inverted), then multiplied by a fixed
//! fusion weight equal to the symbolic similarity weight. The fixed weight
//! keeps the policy consistent across builds: vector-only hits can outrank
//! symbolic fragments only through genuinely higher similarity.

use super::embedder::Embedder;
use super::index::{AnnHit, AnnIndex, SimilarityMetric};
use crate::config::FusionConfig;
use crate::context::token_estimator::TokenEstimator;
use crate::memory::{FragmentStore, MemoryFragment, ScoredCandidate};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Queries the ANN index and merges hits into the candidate set
pub struct VectorFusion {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn AnnIndex>,
    config: FusionConfig,
}

impl VectorFusion {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn AnnIndex>,
        config: FusionConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Embed a fragment and add it to the index. Index failures are the
    /// caller's to log; scoring never depends on this succeeding.
    pub async fn index_fragment(&self, fragment: &MemoryFragment) -> crate::error::Result<()> {
        let vector = self.embedder.embed(&fragment.content).await?;
        self.index
            .add(&fragment.id, vector, Some(fragment.content.clone()))
            .await
    }

    /// Produce additional candidates for hits not already present in the
    /// symbolic set. Returns an empty vector on any collaborator failure.
    pub async fn fuse(
        &self,
        task: &str,
        symbolic: &[ScoredCandidate],
        store: &dyn FragmentStore,
        estimator: &dyn TokenEstimator,
    ) -> Vec<ScoredCandidate> {
        if !self.config.enabled || task.trim().is_empty() {
            return Vec::new();
        }

        let vector = match self.embedder.embed(task).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Embedder unavailable, degrading to symbolic-only scoring: {}", e);
                crate::metrics::METRICS.record_fusion_fallback();
                return Vec::new();
            }
        };

        let hits = match self.index.search(&vector, self.config.top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Vector index unavailable, degrading to symbolic-only scoring: {}", e);
                crate::metrics::METRICS.record_fusion_fallback();
                return Vec::new();
            }
        };
        if hits.is_empty() {
            return Vec::new();
        }

        let known_ids: HashSet<&str> = symbolic
            .iter()
            .map(|c| c.fragment.id.as_str())
            .collect();
        let known_contents: HashSet<&str> = symbolic
            .iter()
            .map(|c| c.fragment.content.as_str())
            .collect();

        let similarities = normalize(&hits, self.index.metric());

        let mut fused = Vec::new();
        for (hit, similarity) in hits.iter().zip(similarities) {
            if known_ids.contains(hit.id.as_str()) {
                continue;
            }
            // Hits arriving through a different storage path may carry a
            // foreign id; fall back to exact content equality.
            if let Some(content) = &hit.content {
                if known_contents.contains(content.as_str()) {
                    continue;
                }
            }

            let score = self.config.weight * similarity;

            let (fragment, ephemeral) = match store.get(&hit.id).await {
                Ok(Some(fragment)) => (fragment, false),
                _ => {
                    let Some(content) = hit.content.clone() else {
                        // Nothing to place in a context; skip the hit.
                        continue;
                    };
                    let mut fragment = MemoryFragment::new(content);
                    fragment.id = hit.id.clone();
                    (fragment, true)
                }
            };

            let token_cost = if fragment.token_cost > 0 {
                fragment.token_cost
            } else {
                estimator.estimate(&fragment.content)
            };

            let mut candidate = ScoredCandidate::new(fragment, score, token_cost);
            candidate.ephemeral = ephemeral;
            fused.push(candidate);
        }

        debug!(hits = hits.len(), fused = fused.len(), "Vector fusion pass");
        fused
    }
}

/// Map raw index scores into [0, 1] similarities
fn normalize(hits: &[AnnHit], metric: SimilarityMetric) -> Vec<f64> {
    match metric {
        SimilarityMetric::Cosine | SimilarityMetric::InnerProduct => hits
            .iter()
            .map(|h| (h.raw_score as f64).clamp(0.0, 1.0))
            .collect(),
        SimilarityMetric::L2 => {
            let min = hits.iter().map(|h| h.raw_score).fold(f32::INFINITY, f32::min);
            let max = hits
                .iter()
                .map(|h| h.raw_score)
                .fold(f32::NEG_INFINITY, f32::max);
            let range = (max - min) as f64;
            hits.iter()
                .map(|h| {
                    if range > 0.0 {
                        1.0 - ((h.raw_score - min) as f64 / range)
                    } else {
                        // A single hit, or all at equal distance: treat as
                        // fully similar.
                        1.0
                    }
                })
                .collect()
        }
    }
}
