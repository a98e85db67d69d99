//! Principal component analysis
//!
//! Embeds centered, flattened images into a low-dimensional space:
//! - Covariance matrix (`C = X^T X / N`)
//! - Top-k eigenpairs via power iteration with deflation
//! - Projection onto the eigenvector basis

pub mod covariance;
pub mod matrix;
pub mod power_iteration;
pub mod projection;

pub use covariance::covariance;
pub use matrix::Matrix;
pub use power_iteration::{create_rng, power_iteration, top_eigenpairs, Eigenpair, PowerIterationParams};
pub use projection::{basis_from_eigenpairs, project, project_batch};

use crate::config::ImageConfig;
use crate::error::RetrievalError;

/// Result of fitting PCA on a centered dataset
#[derive(Debug, Clone, PartialEq)]
pub struct PcaFit {
    /// Eigenvalues in descending order
    pub eigenvalues: Vec<f64>,

    /// `D x k` basis whose columns are the eigenvectors (`Uk`)
    pub basis: Matrix,

    /// `N x k` coordinates of every input sample (`Z`)
    pub projections: Matrix,
}

/// Fit PCA on centered, flattened samples
///
/// # Arguments
///
/// * `samples` - N centered vectors of length D
/// * `k` - Number of components (1..=D)
/// * `config` - Iteration limits and seed
///
/// # Errors
///
/// Returns `EmptyInput` for zero samples, `ShapeMismatch` for ragged
/// samples and `InvalidInput` if `k` is out of range
pub fn fit(samples: &[Vec<f64>], k: usize, config: &ImageConfig) -> Result<PcaFit, RetrievalError> {
    log::debug!("Fitting PCA: {} samples, k={}", samples.len(), k);

    let cov = covariance(samples)?;
    let params = PowerIterationParams {
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
    };
    let mut rng = create_rng(config.seed);
    let pairs = top_eigenpairs(&cov, k, params, &mut rng)?;

    let basis = basis_from_eigenpairs(&pairs)?;
    let projections = project_batch(samples, &basis)?;
    let eigenvalues: Vec<f64> = pairs.into_iter().map(|p| p.eigenvalue).collect();

    Ok(PcaFit {
        eigenvalues,
        basis,
        projections,
    })
}
