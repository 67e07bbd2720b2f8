//! Data models for memory fragments and scored candidates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin of a memory fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Conversation,
    ErrorSolution,
    /// Synthesized by the compactor from evicted fragments
    Summary,
    #[serde(untagged)]
    Other(String),
}

impl Default for SourceType {
    fn default() -> Self {
        SourceType::Conversation
    }
}

/// A stored unit of memory text with scoring metadata.
///
/// Metadata fields carry serde defaults so a stored record missing one of
/// them still loads: timestamps fall back to "now", the rest to their
/// insertion defaults. Only `id` and `content` are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFragment {
    pub id: String,
    pub content: String,
    /// Optional grouping key; `None` means global scope
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Set at insertion, never mutated afterwards
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Advanced by `touch`; recency and eviction ordering read this field
    #[serde(default = "Utc::now")]
    pub accessed_at: DateTime<Utc>,
    /// Caller-supplied weight, default 1.0. Negative values are tolerated.
    #[serde(default = "default_importance")]
    pub importance: f64,
    #[serde(default)]
    pub access_count: u64,
    #[serde(default)]
    pub source_type: SourceType,
    /// Estimated token size of `content`; 0 means "estimate on demand"
    #[serde(default)]
    pub token_cost: usize,
}

fn default_importance() -> f64 {
    1.0
}

impl MemoryFragment {
    /// Create a fragment with a fresh id and current timestamps
    pub fn new(content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            conversation_id: None,
            created_at: now,
            accessed_at: now,
            importance: 1.0,
            access_count: 0,
            source_type: SourceType::default(),
            token_cost: 0,
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_token_cost(mut self, token_cost: usize) -> Self {
        self.token_cost = token_cost;
        self
    }

    /// Age in hours relative to `now`, measured from the last relevant
    /// event (creation or most recent touch). Clamped at zero for clock
    /// skew between writers.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.accessed_at).num_milliseconds() as f64 / 1000.0;
        (seconds / 3600.0).max(0.0)
    }
}

/// A fragment with its composite relevance score. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub fragment: MemoryFragment,
    pub score: f64,
    pub token_cost: usize,
    /// True for vector-only hits that have no persisted fragment record.
    /// Ephemeral candidates are eligible for context assembly but are not
    /// touched unless a persisted fragment with the same id exists.
    pub ephemeral: bool,
}

impl ScoredCandidate {
    pub fn new(fragment: MemoryFragment, score: f64, token_cost: usize) -> Self {
        Self {
            fragment,
            score,
            token_cost,
            ephemeral: false,
        }
    }

    /// Relevance per token, the sort key for budget allocation
    pub fn density(&self) -> f64 {
        self.score / self.token_cost.max(1) as f64
    }
}
