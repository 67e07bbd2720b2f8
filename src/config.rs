//! Engine configuration
//!
//! All tunables live in an explicit `EngineConfig` passed to the engine at
//! construction time. Model token budgets are looked up per call and fail
//! with a clear error for unknown models; there is no process-wide state.

use crate::error::{MemoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Weights for the composite relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of the exponential recency term
    pub recency_weight: f64,
    /// Decay constant for recency, in hours (one-week scale)
    pub recency_decay_hours: f64,
    /// Weight of the TF-IDF cosine similarity term
    pub similarity_weight: f64,
    /// Flat bonus when the fragment matches the conversation filter
    pub conversation_bonus: f64,
    /// Weight of the log access-frequency term
    pub frequency_weight: f64,
    /// Bonus per entity shared between the task and the fragment
    pub entity_weight: f64,
    /// Flat bonus for error-solution fragments
    pub error_solution_bonus: f64,
    /// Multiplier applied to the caller-supplied importance
    pub importance_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            recency_weight: 10.0,
            recency_decay_hours: 168.0,
            similarity_weight: 20.0,
            conversation_bonus: 15.0,
            frequency_weight: 5.0,
            entity_weight: 8.0,
            error_solution_bonus: 12.0,
            importance_weight: 10.0,
        }
    }
}

/// Tier caps for budget-constrained context assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeringConfig {
    /// Fraction of the budget reserved for the essential tier
    pub essential_fraction: f64,
    /// Cumulative fraction cap through the relevant tier
    pub relevant_fraction: f64,
    /// Cumulative hard cap for the whole context
    pub hard_cap_fraction: f64,
    /// Minimum score for a fragment to qualify as essential
    pub essential_threshold: f64,
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            essential_fraction: 0.20,
            relevant_fraction: 0.80,
            hard_cap_fraction: 0.95,
            essential_threshold: 40.0,
        }
    }
}

/// Compaction policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Maximum number of live fragments before compaction triggers
    pub max_fragments: usize,
    /// Importance assigned to synthesized summary fragments
    pub summary_importance: f64,
    /// Hard token cap for a synthesized summary
    pub summary_token_cap: usize,
    /// Number of top-scored sentences kept by the extractive compressor
    pub summary_sentences: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            max_fragments: 1000,
            summary_importance: 0.8,
            summary_token_cap: 120,
            summary_sentences: 3,
        }
    }
}

/// Vector fusion policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Number of nearest neighbours requested from the ANN index
    pub top_k: usize,
    /// Fixed weight applied to normalized vector similarity. Matches the
    /// symbolic similarity weight so vector-only hits compete on the same
    /// scale as lexically scored fragments.
    pub weight: f64,
    pub enabled: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            weight: 20.0,
            enabled: true,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Token budgets keyed by model name
    #[serde(default = "default_token_budgets")]
    pub token_budgets: HashMap<String, usize>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub layering: LayeringConfig,
    #[serde(default)]
    pub compaction: CompactionConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
}

fn default_token_budgets() -> HashMap<String, usize> {
    let mut budgets = HashMap::new();
    budgets.insert("gpt-4".to_string(), 8000);
    budgets.insert("gpt-3.5-turbo".to_string(), 4000);
    budgets.insert("claude-3".to_string(), 100_000);
    budgets
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_budgets: default_token_budgets(),
            scoring: ScoringConfig::default(),
            layering: LayeringConfig::default(),
            compaction: CompactionConfig::default(),
            fusion: FusionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, with `MEMORY_CONTEXT_*`
    /// environment variables taking precedence.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("MEMORY_CONTEXT").separator("__"))
            .build()
            .map_err(|e| MemoryError::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| MemoryError::Configuration(e.to_string()))
    }

    /// Look up the token budget for a model name
    pub fn budget_for(&self, model: &str) -> Result<usize> {
        self.token_budgets
            .get(model)
            .copied()
            .ok_or_else(|| MemoryError::UnknownModel(model.to_string()))
    }
}
