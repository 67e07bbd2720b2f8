//! Composite relevance scoring
//!
//! Fuses symbolic signals (recency, importance, access frequency, entity
//! overlap, conversation affinity) with a lexical TF-IDF similarity into a
//! single score per fragment. Vector similarity from the ANN index is
//! merged on the same scale by the fusion adapter, not here.

use super::token_estimator::TokenEstimator;
use crate::config::ScoringConfig;
use crate::entities::EntityExtractor;
use crate::memory::{MemoryFragment, ScoredCandidate, SourceType};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Sparse TF-IDF vectors over a shared vocabulary, L2-normalized per
/// document. IndexMap keeps iteration deterministic.
fn tfidf_vectors(docs: &[&str]) -> Vec<IndexMap<String, f64>> {
    let tokens_list: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();

    let mut df: HashMap<&str, usize> = HashMap::new();
    for tokens in &tokens_list {
        let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for word in seen {
            *df.entry(word).or_insert(0) += 1;
        }
    }

    let n = docs.len() as f64;
    let mut vectors = Vec::with_capacity(tokens_list.len());
    for tokens in &tokens_list {
        let mut tf: IndexMap<String, f64> = IndexMap::new();
        for token in tokens {
            *tf.entry(token.clone()).or_insert(0.0) += 1.0;
        }
        let mut vec: IndexMap<String, f64> = tf
            .into_iter()
            .map(|(word, count)| {
                let idf = ((1.0 + n) / (1.0 + df[word.as_str()] as f64)).ln() + 1.0;
                (word, count * idf)
            })
            .collect();
        let norm = vec.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in vec.values_mut() {
                *value /= norm;
            }
        }
        vectors.push(vec);
    }
    vectors
}

fn cosine(a: &IndexMap<String, f64>, b: &IndexMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    // Iterate the smaller vector.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(word, value)| large.get(word).map(|other| value * other))
        .sum()
}

/// Computes a composite score and token cost for every candidate fragment
pub struct RelevanceScorer {
    config: ScoringConfig,
    estimator: Arc<dyn TokenEstimator>,
    extractor: Arc<dyn EntityExtractor>,
}

impl RelevanceScorer {
    pub fn new(
        config: ScoringConfig,
        estimator: Arc<dyn TokenEstimator>,
        extractor: Arc<dyn EntityExtractor>,
    ) -> Self {
        Self {
            config,
            estimator,
            extractor,
        }
    }

    /// Score every fragment against the current task.
    ///
    /// Output is ordered by descending score; ties break by earliest
    /// recency marker, then id, so the ordering is deterministic and
    /// independent of input permutation.
    pub fn score_all(
        &self,
        fragments: &[MemoryFragment],
        task: Option<&str>,
        conversation_filter: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let task = task.filter(|t| !t.trim().is_empty());

        // Vocabulary spans the candidate set plus the task.
        let mut docs: Vec<&str> = fragments.iter().map(|f| f.content.as_str()).collect();
        if let Some(task_text) = task {
            docs.push(task_text);
        }
        let vectors = tfidf_vectors(&docs);
        let task_vector = if task.is_some() { vectors.last() } else { None };

        let task_entities = task.map(|t| self.extractor.extract(t)).unwrap_or_default();

        let mut scored: Vec<ScoredCandidate> = fragments
            .iter()
            .enumerate()
            .map(|(idx, fragment)| {
                let mut score = 0.0;

                let age_hours = fragment.age_hours(now);
                score += self.config.recency_weight
                    * (-age_hours / self.config.recency_decay_hours).exp();

                if let Some(task_vec) = task_vector {
                    let similarity = cosine(&vectors[idx], task_vec);
                    score += self.config.similarity_weight * similarity;
                }

                if let (Some(filter), Some(conv)) =
                    (conversation_filter, fragment.conversation_id.as_deref())
                {
                    if filter == conv {
                        score += self.config.conversation_bonus;
                    }
                }

                score += self.config.frequency_weight * (1.0 + fragment.access_count as f64).ln();

                if !task_entities.is_empty() {
                    let fragment_entities = self.extractor.extract(&fragment.content);
                    let overlap = fragment_entities.intersection(&task_entities).count();
                    score += self.config.entity_weight * overlap as f64;
                }

                if fragment.source_type == SourceType::ErrorSolution {
                    score += self.config.error_solution_bonus;
                }

                score += fragment.importance * self.config.importance_weight;

                let token_cost = if fragment.token_cost > 0 {
                    fragment.token_cost
                } else {
                    self.estimator.estimate(&fragment.content)
                };

                ScoredCandidate::new(fragment.clone(), score, token_cost)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.fragment.accessed_at.cmp(&b.fragment.accessed_at))
                .then_with(|| a.fragment.id.cmp(&b.fragment.id))
        });

        debug!(
            candidates = scored.len(),
            with_task = task.is_some(),
            "Scored fragment corpus"
        );

        scored
    }
}
