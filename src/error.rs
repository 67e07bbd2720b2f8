//! Error types for the memory context engine

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors produced by the memory context engine
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Compaction failed to reduce corpus: {size} fragments remain, max is {max_size}")]
    CompactionIncomplete { size: usize, max_size: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}
