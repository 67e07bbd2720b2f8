//! Memory engine: the exposed surface over scoring, budgeting, and
//! compaction
//!
//! `build_optimal_context` is the single read operation callers need;
//! `remember` and `on_corpus_mutated` cover the write side. Ordinary
//! data-quality problems (empty task, empty corpus, unavailable vector
//! collaborators) produce a possibly-empty context string, never an error.
//! Only programmer errors, such as an unknown model name, propagate.

use crate::config::EngineConfig;
use crate::context::layering::{build_layers, ContextLayers};
use crate::context::scorer::RelevanceScorer;
use crate::context::token_estimator::{HeuristicEstimator, TokenEstimator};
use crate::entities::{EntityExtractor, RegexExtractor};
use crate::error::Result;
use crate::fusion::{AnnIndex, Embedder, VectorFusion};
use crate::memory::{
    Compactor, FragmentStore, MemoryFragment, ScoredCandidate, SourceType,
};
use crate::metrics::METRICS;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrates the memory relevance and context budgeting pipeline
pub struct MemoryEngine {
    config: EngineConfig,
    store: Arc<dyn FragmentStore>,
    scorer: RelevanceScorer,
    estimator: Arc<dyn TokenEstimator>,
    compactor: Compactor,
    fusion: Option<VectorFusion>,
}

impl MemoryEngine {
    /// Create an engine with the default heuristic estimator and regex
    /// entity extractor, without vector fusion.
    pub fn new(config: EngineConfig, store: Arc<dyn FragmentStore>) -> Self {
        let estimator: Arc<dyn TokenEstimator> = Arc::new(HeuristicEstimator::new());
        let extractor: Arc<dyn EntityExtractor> = Arc::new(RegexExtractor::new());
        Self::with_components(config, store, estimator, extractor)
    }

    /// Create an engine with explicit estimator and extractor implementations
    pub fn with_components(
        config: EngineConfig,
        store: Arc<dyn FragmentStore>,
        estimator: Arc<dyn TokenEstimator>,
        extractor: Arc<dyn EntityExtractor>,
    ) -> Self {
        let scorer = RelevanceScorer::new(config.scoring.clone(), estimator.clone(), extractor);
        let compactor = Compactor::new(config.compaction.clone(), estimator.clone());
        Self {
            config,
            store,
            scorer,
            estimator,
            compactor,
            fusion: None,
        }
    }

    /// Attach a vector fusion adapter (embedder + ANN index)
    pub fn with_fusion(mut self, embedder: Arc<dyn Embedder>, index: Arc<dyn AnnIndex>) -> Self {
        self.fusion = Some(VectorFusion::new(
            embedder,
            index,
            self.config.fusion.clone(),
        ));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a context for a named model, using its configured token budget
    pub async fn build_optimal_context(
        &self,
        model: &str,
        task: Option<&str>,
        conversation_filter: Option<&str>,
    ) -> Result<String> {
        let budget = self.config.budget_for(model)?;
        self.build_context_with_budget(task, conversation_filter, budget)
            .await
    }

    /// Build a context against an explicit token budget.
    ///
    /// Every persisted fragment that lands in the final context is touched
    /// exactly once: its access count goes up and its recency marker moves
    /// forward, feeding future scoring rounds.
    pub async fn build_context_with_budget(
        &self,
        task: Option<&str>,
        conversation_filter: Option<&str>,
        token_budget: usize,
    ) -> Result<String> {
        let started = Instant::now();
        let outcome = self.assemble(task, conversation_filter, token_budget).await;
        METRICS
            .context_build_duration
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok((layers, candidates)) => {
                let tokens_used = layers.total_tokens();
                METRICS.record_context_build(true, tokens_used, candidates);
                debug!(
                    tokens_used,
                    token_budget,
                    candidates,
                    "Built optimal context"
                );
                Ok(layers.render())
            }
            Err(e) => {
                METRICS.record_context_build(false, 0, 0);
                Err(e)
            }
        }
    }

    async fn assemble(
        &self,
        task: Option<&str>,
        conversation_filter: Option<&str>,
        token_budget: usize,
    ) -> Result<(ContextLayers, usize)> {
        let fragments = self.store.get_all(None).await?;
        let mut scored =
            self.scorer
                .score_all(&fragments, task, conversation_filter, Utc::now());

        if let (Some(fusion), Some(task_text)) = (&self.fusion, task) {
            let fused = fusion
                .fuse(task_text, &scored, self.store.as_ref(), self.estimator.as_ref())
                .await;
            scored.extend(fused);
        }

        let layers = build_layers(&scored, token_budget, &self.config.layering);

        for candidate in layers.iter() {
            if candidate.ephemeral {
                continue;
            }
            self.store.touch(&candidate.fragment.id).await?;
        }

        let candidates = scored.len();
        Ok((layers, candidates))
    }

    /// Score the corpus without assembling a context. No touch side effect.
    pub async fn score_corpus(
        &self,
        task: Option<&str>,
        conversation_filter: Option<&str>,
    ) -> Result<Vec<ScoredCandidate>> {
        let fragments = self.store.get_all(None).await?;
        Ok(self
            .scorer
            .score_all(&fragments, task, conversation_filter, Utc::now()))
    }

    /// Insert a new fragment, index its embedding when fusion is
    /// configured, and run the compaction check.
    pub async fn remember(
        &self,
        content: impl Into<String>,
        conversation_id: Option<String>,
        importance: f64,
        source_type: SourceType,
    ) -> Result<String> {
        let content = content.into();
        let token_cost = self.estimator.estimate(&content);

        let mut fragment = MemoryFragment::new(content)
            .with_importance(importance)
            .with_source_type(source_type)
            .with_token_cost(token_cost);
        fragment.conversation_id = conversation_id;

        if let Some(fusion) = &self.fusion {
            if let Err(e) = fusion.index_fragment(&fragment).await {
                // The fragment is still fully usable through symbolic
                // scoring; the index can be rebuilt later.
                warn!("Failed to index fragment embedding: {}", e);
            }
        }

        let id = self.store.add(fragment).await?;
        self.on_corpus_mutated().await?;
        Ok(id)
    }

    /// Compaction check against the configured corpus size, safe to call
    /// after every corpus mutation
    pub async fn on_corpus_mutated(&self) -> Result<()> {
        self.compact_to(self.config.compaction.max_fragments).await
    }

    /// Compaction check against an explicit corpus size
    pub async fn compact_to(&self, max_size: usize) -> Result<()> {
        let report = self
            .compactor
            .compact(self.store.as_ref(), max_size)
            .await?;

        if let Some(report) = report {
            METRICS.record_compaction(report.evicted);
            info!(
                evicted = report.evicted,
                summary_id = %report.summary_id,
                "Corpus compacted"
            );
        }
        Ok(())
    }
}
