//! Ranking of stored items against a query
//!
//! Images are ranked by Euclidean distance between PCA projections, with a
//! relative similarity percentage; melodies by their aggregated feature-set
//! score.

use rayon::prelude::*;

use super::result::{ImageMatch, MelodyMatch};
use crate::config::MelodyConfig;
use crate::error::RetrievalError;
use crate::features::melody::{score, FeatureSet};
use crate::features::pca::Matrix;

/// Rank stored projections by distance to a query projection
///
/// The similarity percentage is `(1 - d / max_d) * 100` where `max_d` is the
/// largest distance over *all* stored rows, so the closest item is not
/// necessarily 100 %. If `max_d` is zero every item coincides with the query
/// and gets 100 %.
///
/// # Arguments
///
/// * `query` - Length-`k` projection of the query
/// * `stored` - `N x k` stored projections
/// * `top_k` - Maximum number of results
///
/// # Returns
///
/// At most `top_k` matches sorted by ascending distance; ties keep stored
/// order
///
/// # Errors
///
/// Returns `ShapeMismatch` if the query length differs from the stored
/// projection width
pub fn rank_projections(
    query: &[f64],
    stored: &Matrix,
    top_k: usize,
) -> Result<Vec<ImageMatch>, RetrievalError> {
    if stored.rows() == 0 {
        return Ok(Vec::new());
    }
    if query.len() != stored.cols() {
        return Err(RetrievalError::shape_mismatch(
            "query projection vs stored projections",
            &[stored.cols()],
            &[query.len()],
        ));
    }

    let distances: Vec<f64> = (0..stored.rows())
        .map(|i| euclidean_distance(query, stored.row(i)))
        .collect();
    let max_distance = distances.iter().copied().fold(0.0f64, f64::max);
    if max_distance == 0.0 {
        log::warn!("All stored projections coincide with the query; reporting 100% similarity");
    }

    let mut matches: Vec<ImageMatch> = distances
        .into_iter()
        .enumerate()
        .map(|(index, distance)| ImageMatch {
            index,
            distance,
            similarity_percentage: similarity_percentage(distance, max_distance),
        })
        .collect();

    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    matches.truncate(top_k);
    Ok(matches)
}

/// Score a query feature set against stored feature sets
///
/// Scoring runs in parallel. An empty query or stored set scores 0.0.
///
/// # Returns
///
/// At most `top_k` matches sorted by descending score; ties keep stored
/// order
///
/// # Errors
///
/// Returns `ShapeMismatch` if a set is ragged or a stored set's histogram
/// lengths differ from the query's
pub fn rank_feature_sets(
    query: &FeatureSet,
    stored: &[FeatureSet],
    top_k: usize,
    config: &MelodyConfig,
) -> Result<Vec<MelodyMatch>, RetrievalError> {
    query.validate_shape()?;
    if let Some(lengths) = query.histogram_lengths() {
        for (index, candidate) in stored.iter().enumerate() {
            candidate.check_lengths(lengths, &format!("stored melody {} vs query histograms", index))?;
        }
    }

    let mut matches: Vec<MelodyMatch> = stored
        .par_iter()
        .enumerate()
        .map(|(index, candidate)| MelodyMatch {
            index,
            score: score(query, candidate, &config.weights, config.aggregation),
        })
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(top_k);
    Ok(matches)
}

/// Euclidean distance between equal-length vectors
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn similarity_percentage(distance: f64, max_distance: f64) -> f64 {
    if max_distance == 0.0 {
        return 100.0;
    }
    ((1.0 - distance / max_distance) * 100.0).clamp(0.0, 100.0)
}
