//! Melody fingerprinting and similarity
//!
//! - Windowed ATB/RTB/FTB feature sets from pitch sequences
//! - Cosine-based window scoring with Max or Mean aggregation

pub mod extractor;
pub mod similarity;

pub use extractor::{extract_features, extract_features_batch, FeatureSet, WindowHistograms};
pub use similarity::{
    cosine_similarity, score, window_similarity, ScoreAggregation, SimilarityWeights,
};
