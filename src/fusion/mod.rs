//! Vector fusion: merging ANN similarity hits into the symbolic ranking
//!
//! The embedding model and the nearest-neighbour index are opaque
//! collaborators behind traits. The adapter normalizes raw index scores
//! onto the symbolic score scale so vector hits compete fairly with
//! lexically scored fragments. Any collaborator failure degrades to
//! symbolic-only scoring instead of failing the build.

pub mod adapter;
pub mod embedder;
pub mod index;
pub mod qdrant;

pub use adapter::VectorFusion;
pub use embedder::{Embedder, HashEmbedder, HttpEmbedder, HttpEmbedderConfig};
pub use index::{AnnHit, AnnIndex, InMemoryIndex, SimilarityMetric};
pub use qdrant::{QdrantIndex, QdrantIndexConfig};
