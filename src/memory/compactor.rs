//! Capacity-bounded compaction
//!
//! When the corpus grows past its configured size, the lowest-value
//! fragments (least important, then oldest) are evicted and replaced by a
//! single extractive summary fragment. Safe to call after every mutation.

use super::models::{MemoryFragment, SourceType};
use super::store::FragmentStore;
use crate::config::CompactionConfig;
use crate::context::compressor::ExtractiveCompressor;
use crate::context::token_estimator::TokenEstimator;
use crate::error::{MemoryError, Result};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a committed compaction pass
#[derive(Debug, Clone)]
pub struct CompactionReport {
    pub summary_id: String,
    pub evicted: usize,
}

/// Evicts low-value fragments and synthesizes summaries
pub struct Compactor {
    config: CompactionConfig,
    compressor: ExtractiveCompressor,
    estimator: Arc<dyn TokenEstimator>,
}

impl Compactor {
    pub fn new(config: CompactionConfig, estimator: Arc<dyn TokenEstimator>) -> Self {
        let compressor =
            ExtractiveCompressor::new(config.summary_sentences, config.summary_token_cap);
        Self {
            config,
            compressor,
            estimator,
        }
    }

    /// Drop trailing whole words until the estimator agrees the text fits
    /// the summary token cap.
    fn trim_to_token_cap(&self, text: String) -> String {
        let mut words: Vec<&str> = text.split_whitespace().collect();
        let mut trimmed = words.join(" ");
        while !words.is_empty() && self.estimator.estimate(&trimmed) > self.config.summary_token_cap
        {
            let drop = (words.len() / 10).max(1);
            words.truncate(words.len() - drop);
            trimmed = words.join(" ");
        }
        trimmed
    }

    /// Enforce `max_size` on the corpus. Returns a report when a
    /// compaction ran, `None` when the corpus was already within bounds.
    pub async fn compact(
        &self,
        store: &dyn FragmentStore,
        max_size: usize,
    ) -> Result<Option<CompactionReport>> {
        let size = store.count().await?;
        if size <= max_size {
            return Ok(None);
        }

        let mut fragments = store.get_all(None).await?;
        // Least important first; among equals, oldest relevant event
        // first. Id as final key keeps the batch deterministic.
        fragments.sort_by(|a, b| {
            a.importance
                .partial_cmp(&b.importance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.accessed_at.cmp(&b.accessed_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        // One extra beyond the overflow so the very next insertion does
        // not re-trigger compaction.
        let batch_size = (size - max_size + 1).min(fragments.len());
        let batch = &fragments[..batch_size];

        debug!(
            size,
            max_size,
            batch = batch.len(),
            "Compacting corpus overflow"
        );

        let combined = batch
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let summary_text = self.trim_to_token_cap(self.compressor.compress_text(&combined));

        for fragment in batch {
            store.delete(&fragment.id).await?;
        }

        let token_cost = self.estimator.estimate(&summary_text);
        let summary = MemoryFragment::new(summary_text)
            .with_source_type(SourceType::Summary)
            .with_importance(self.config.summary_importance)
            .with_token_cost(token_cost);
        let summary_id = store.add(summary).await?;

        let after = store.count().await?;
        if after > max_size {
            // Deleting the batch and inserting one summary must land the
            // corpus within bounds; anything else is a logic bug.
            return Err(MemoryError::CompactionIncomplete {
                size: after,
                max_size,
            });
        }

        info!(
            evicted = batch.len(),
            size_after = after,
            summary_id = %summary_id,
            "Compaction committed"
        );

        Ok(Some(CompactionReport {
            summary_id,
            evicted: batch.len(),
        }))
    }
}
