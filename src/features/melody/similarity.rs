//! Melody similarity scoring
//!
//! Two feature sets are compared window by window. Each window pair gets
//! the weighted sum of the cosine similarities of its ATB, RTB and FTB
//! histograms; the pair scores are then aggregated into one number.

use serde::{Deserialize, Serialize};

use super::extractor::{FeatureSet, WindowHistograms};
use crate::error::RetrievalError;

/// Weight of each histogram kind in a window-pair score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    /// Absolute tone bins (default: 0.3)
    pub atb: f32,
    /// Relative tone bins (default: 0.5)
    pub rtb: f32,
    /// First-tone bins (default: 0.2)
    pub ftb: f32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            atb: 0.3,
            rtb: 0.5,
            ftb: 0.2,
        }
    }
}

impl SimilarityWeights {
    /// Reject negative or non-finite weights
    pub fn validate(&self) -> Result<(), RetrievalError> {
        for (name, w) in [("atb", self.atb), ("rtb", self.rtb), ("ftb", self.ftb)] {
            if !w.is_finite() || w < 0.0 {
                return Err(RetrievalError::InvalidInput(format!(
                    "Similarity weight {} must be non-negative, got {}",
                    name, w
                )));
            }
        }
        Ok(())
    }
}

/// How window-pair scores combine into a melody score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreAggregation {
    /// Best-aligning window pair
    Max,
    /// Average over all window pairs
    Mean,
}

/// Cosine similarity of two histograms
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        log::warn!(
            "Cosine similarity of vectors with different lengths ({} vs {}), returning 0",
            a.len(),
            b.len()
        );
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Weighted similarity of two windows
pub fn window_similarity(
    a: &WindowHistograms,
    b: &WindowHistograms,
    weights: &SimilarityWeights,
) -> f32 {
    weights.atb * cosine_similarity(&a.atb, &b.atb)
        + weights.rtb * cosine_similarity(&a.rtb, &b.rtb)
        + weights.ftb * cosine_similarity(&a.ftb, &b.ftb)
}

/// Score two melodies
///
/// # Arguments
///
/// * `a`, `b` - Feature sets to compare
/// * `weights` - Per-histogram weights
/// * `aggregation` - `Max` over window pairs, or their `Mean`
///
/// # Returns
///
/// Aggregated similarity; 0.0 if either set is empty. Symmetric in `a`
/// and `b`.
pub fn score(
    a: &FeatureSet,
    b: &FeatureSet,
    weights: &SimilarityWeights,
    aggregation: ScoreAggregation,
) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let pairs = a
        .windows
        .iter()
        .flat_map(|wa| b.windows.iter().map(move |wb| window_similarity(wa, wb, weights)));

    match aggregation {
        ScoreAggregation::Max => pairs.fold(f32::NEG_INFINITY, f32::max),
        ScoreAggregation::Mean => {
            let total: f64 = pairs.map(|s| s as f64).sum();
            (total / (a.len() * b.len()) as f64) as f32
        }
    }
}
