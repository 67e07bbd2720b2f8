//! Memory fragments: data model, storage boundary, and compaction

pub mod compactor;
pub mod models;
pub mod store;

pub use compactor::{CompactionReport, Compactor};
pub use models::{MemoryFragment, ScoredCandidate, SourceType};
pub use store::{FragmentStore, InMemoryStore};
