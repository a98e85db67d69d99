//! # Stratum Retrieval
//!
//! Content-based similarity retrieval for music libraries: album covers are
//! embedded with PCA and ranked by distance, melodies are fingerprinted with
//! fuzzy pitch/interval histograms and ranked by score.
//!
//! ## Features
//!
//! - **Image space**: mean-centering, covariance, power iteration with
//!   deflation, projection of query images
//! - **Melody fingerprints**: windowed ATB/RTB/FTB fuzzy histograms with
//!   optional truncation
//! - **Ranking**: Euclidean distance with similarity percentages, and
//!   best-window melody scoring
//! - **Persistence**: nested-array records behind a pluggable store
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_retrieval::{extract_melody_features, rank_melodies, MelodyConfig};
//!
//! let config = MelodyConfig::default();
//! let query: Vec<Option<u8>> = vec![]; // Per-quantum pitches from a transcriber
//! let stored = vec![extract_melody_features(&query, &config)?];
//!
//! let query_features = extract_melody_features(&query, &config)?;
//! for m in rank_melodies(&query_features, &stored, 10, &config)? {
//!     println!("#{}: {:.3}", m.index, m.score);
//! }
//! # Ok::<(), stratum_retrieval::RetrievalError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Images  → Grayscale/Resize → Centering → PCA → Projection → Ranking
//! Pitches → Rest filter → Windows → Fuzzy histograms → Scoring → Ranking
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::catalog::{ImageCatalog, MelodyCatalog};
pub use analysis::records::{ImageSpaceRecord, MelodyRecord};
pub use analysis::result::{ImageMatch, ImageSpace, MelodyMatch, NamedImageMatch, NamedMelodyMatch};
pub use config::{ImageConfig, MelodyConfig, RetrievalConfig};
pub use error::RetrievalError;
pub use features::melody::FeatureSet;
pub use features::pca::Matrix;
pub use io::store::{MemoryStore, Record, RecordId, RecordStore};
pub use preprocessing::image::ImageMatrix;
pub use preprocessing::pitch::PitchSequence;

use std::time::Instant;

/// Fit a PCA image space
///
/// Centers the images on their mean, computes the covariance matrix and
/// extracts the `k` dominant eigenpairs by power iteration with deflation.
///
/// # Arguments
///
/// * `images` - Non-empty set of equally sized grayscale images
/// * `k` - Number of components, `1..=height*width`
/// * `config` - Iteration limits and seed; `components`, `height` and
///   `width` are not used (or validated) here, `k` and the input images
///   decide them
///
/// # Returns
///
/// `ImageSpace` with the mean image, `D x k` basis, eigenvalues and the
/// `N x k` projections of the inputs
///
/// # Errors
///
/// Returns `EmptyInput` for no images, `ShapeMismatch` if the images differ
/// in size and `InvalidInput` for an out-of-range `k` or unusable iteration
/// limits
///
/// # Example
///
/// ```
/// use stratum_retrieval::{fit_image_space, ImageConfig, ImageMatrix};
///
/// let images = vec![ImageMatrix::zeros(10, 10); 5];
/// let config = ImageConfig { seed: Some(1), ..ImageConfig::default() };
/// let space = fit_image_space(&images, 3, &config)?;
/// assert!(space.eigenvalues.iter().all(|v| v.abs() < 1e-9));
/// # Ok::<(), stratum_retrieval::RetrievalError>(())
/// ```
pub fn fit_image_space(
    images: &[ImageMatrix],
    k: usize,
    config: &ImageConfig,
) -> Result<ImageSpace, RetrievalError> {
    let start_time = Instant::now();
    log::debug!("Fitting image space: {} images, k={}", images.len(), k);
    config.validate_solver()?;

    let centered = preprocessing::centering::center_images(images)?;
    let fit = features::pca::fit(&centered.samples, k, config)?;

    log::debug!(
        "Image space fitted in {:.2} ms (D={}, k={})",
        start_time.elapsed().as_secs_f32() * 1000.0,
        centered.dimension(),
        k
    );

    Ok(ImageSpace {
        mean_image: centered.mean_image,
        basis: fit.basis,
        eigenvalues: fit.eigenvalues,
        projections: fit.projections,
    })
}

/// Project a query image into a fitted space
///
/// # Errors
///
/// Returns `ShapeMismatch` if the query differs in size from the mean image
/// or the basis does not match the pixel count
pub fn project_query_image(
    query: &ImageMatrix,
    mean_image: &ImageMatrix,
    basis: &Matrix,
) -> Result<Vec<f64>, RetrievalError> {
    log::debug!("Projecting {}x{} query image", query.height(), query.width());
    let centered = preprocessing::centering::center_image(query, mean_image)?;
    features::pca::project(&centered, basis)
}

/// Rank stored projections against a query projection
///
/// See [`analysis::ranking::rank_projections`] for the percentage rule.
///
/// # Returns
///
/// At most `top_k` matches, ascending by distance
pub fn rank_images(
    query_projection: &[f64],
    stored_projections: &Matrix,
    top_k: usize,
) -> Result<Vec<ImageMatch>, RetrievalError> {
    log::debug!(
        "Ranking {} stored images, top_k={}",
        stored_projections.rows(),
        top_k
    );
    analysis::ranking::rank_projections(query_projection, stored_projections, top_k)
}

/// Project a query image and rank the images of a fitted space
pub fn rank_by_image(
    query: &ImageMatrix,
    space: &ImageSpace,
    top_k: usize,
) -> Result<Vec<ImageMatch>, RetrievalError> {
    space.validate()?;
    let projection = project_query_image(query, &space.mean_image, &space.basis)?;
    rank_images(&projection, &space.projections, top_k)
}

/// Fingerprint a pitch sequence
///
/// Sequences with fewer notes than one window yield an empty feature set.
pub fn extract_melody_features(
    sequence: &[Option<u8>],
    config: &MelodyConfig,
) -> Result<FeatureSet, RetrievalError> {
    features::melody::extract_features(sequence, config)
}

/// Rank stored feature sets against a query feature set
///
/// # Returns
///
/// At most `top_k` matches, descending by score
///
/// # Errors
///
/// Returns `InvalidInput` for an unusable configuration and `ShapeMismatch`
/// if a stored set's histogram lengths differ from the query's
pub fn rank_melodies(
    query: &FeatureSet,
    stored: &[FeatureSet],
    top_k: usize,
    config: &MelodyConfig,
) -> Result<Vec<MelodyMatch>, RetrievalError> {
    config.validate()?;
    log::debug!(
        "Ranking {} stored melodies against {} query windows, top_k={}",
        stored.len(),
        query.len(),
        top_k
    );
    analysis::ranking::rank_feature_sets(query, stored, top_k, config)
}

/// Fingerprint a query pitch sequence and rank stored feature sets
pub fn rank_by_melody(
    sequence: &[Option<u8>],
    stored: &[FeatureSet],
    top_k: usize,
    config: &MelodyConfig,
) -> Result<Vec<MelodyMatch>, RetrievalError> {
    let query = extract_melody_features(sequence, config)?;
    rank_melodies(&query, stored, top_k, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_and_rank_by_image() {
        let images: Vec<ImageMatrix> = (0..4)
            .map(|i| ImageMatrix::new(3, 3, (0..9).map(|p| ((p * (i + 1)) % 7) as f64).collect()).unwrap())
            .collect();
        let config = ImageConfig {
            seed: Some(21),
            ..ImageConfig::default()
        };
        let space = fit_image_space(&images, 2, &config).unwrap();
        assert_eq!(space.components(), 2);
        assert_eq!(space.len(), 4);
        assert!(space.eigenvalues[0] >= space.eigenvalues[1] - 1e-9);

        let matches = rank_by_image(&images[2], &space, 4).unwrap();
        assert_eq!(matches[0].index, 2);
        assert!(matches[0].distance < 1e-9);
    }

    #[test]
    fn test_fit_rejects_bad_config() {
        let images = vec![ImageMatrix::zeros(2, 2)];
        let config = ImageConfig {
            tolerance: 0.0,
            ..ImageConfig::default()
        };
        assert!(fit_image_space(&images, 1, &config).is_err());
    }

    #[test]
    fn test_fit_uses_k_not_components() {
        let images = vec![ImageMatrix::zeros(2, 2); 3];
        let config = ImageConfig {
            components: 0,
            height: 7,
            width: 7,
            seed: Some(3),
            ..ImageConfig::default()
        };
        assert!(config.validate().is_err());
        let space = fit_image_space(&images, 2, &config).unwrap();
        assert_eq!(space.components(), 2);
        assert_eq!(space.mean_image.shape(), (2, 2));
    }

    #[test]
    fn test_rank_by_melody() {
        let config = MelodyConfig {
            window_size: 4,
            hop_size: 1,
            ..MelodyConfig::default()
        };
        let a: Vec<Option<u8>> = [60, 64, 67, 72, 67].iter().map(|&p| Some(p)).collect();
        let b: Vec<Option<u8>> = [60, 61, 60, 61, 60].iter().map(|&p| Some(p)).collect();
        let stored = vec![
            extract_melody_features(&b, &config).unwrap(),
            extract_melody_features(&a, &config).unwrap(),
        ];
        let matches = rank_by_melody(&a, &stored, 2, &config).unwrap();
        assert_eq!(matches[0].index, 1);
        assert!(matches[0].score > matches[1].score);
    }
}
