//! Context assembly: scoring, budgeting, and compression

pub mod compressor;
pub mod layering;
pub mod scorer;
pub mod token_estimator;

pub use compressor::ExtractiveCompressor;
pub use layering::{build_layers, ContextLayers, ContextTier};
pub use scorer::RelevanceScorer;
pub use token_estimator::{HeuristicEstimator, TokenEstimator, WordBasedEstimator};
