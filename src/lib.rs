//! Memory relevance scoring and token-budgeted context assembly.
//!
//! The engine ranks stored memory fragments against a current task by fusing
//! symbolic signals (recency, importance, access frequency, entity overlap,
//! conversation affinity) with vector similarity from an ANN index, then
//! packs the highest-value fragments into a fixed token budget across three
//! tiers (essential, relevant, supplemental). A capacity-bounded compactor
//! keeps the corpus below a configured size by evicting low-value fragments
//! and replacing them with an extractive summary.

pub mod config;
pub mod context;
pub mod engine;
pub mod entities;
pub mod error;
pub mod fusion;
pub mod memory;
pub mod metrics;

pub use config::EngineConfig;
pub use engine::MemoryEngine;
pub use error::{MemoryError, Result};

/// Convenience re-exports for consumers
pub mod prelude {
    pub use crate::config::{
        CompactionConfig, EngineConfig, FusionConfig, LayeringConfig, ScoringConfig,
    };
    pub use crate::context::{
        build_layers, ContextLayers, ContextTier, ExtractiveCompressor, HeuristicEstimator,
        RelevanceScorer, TokenEstimator,
    };
    pub use crate::engine::MemoryEngine;
    pub use crate::entities::{Entity, EntityExtractor, EntityKind, RegexExtractor};
    pub use crate::error::{MemoryError, Result};
    pub use crate::fusion::{AnnIndex, Embedder, HashEmbedder, InMemoryIndex, VectorFusion};
    pub use crate::memory::{
        Compactor, FragmentStore, InMemoryStore, MemoryFragment, ScoredCandidate, SourceType,
    };
}
