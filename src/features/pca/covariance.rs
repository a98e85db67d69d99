//! Sample covariance of centered data

use super::matrix::Matrix;
use crate::error::RetrievalError;

/// Compute `C = (1/N) * X^T X` over centered, flattened samples
///
/// Only the upper triangle is accumulated; the lower triangle is mirrored,
/// so the result is exactly symmetric.
///
/// # Arguments
///
/// * `samples` - N centered vectors of equal length D
///
/// # Returns
///
/// `D x D` covariance matrix
///
/// # Errors
///
/// Returns `EmptyInput` for zero samples and `ShapeMismatch` if the
/// samples differ in length
pub fn covariance(samples: &[Vec<f64>]) -> Result<Matrix, RetrievalError> {
    let first = samples.first().ok_or_else(|| {
        RetrievalError::EmptyInput("Cannot compute covariance of zero samples".to_string())
    })?;
    let dim = first.len();

    for (i, sample) in samples.iter().enumerate() {
        if sample.len() != dim {
            return Err(RetrievalError::shape_mismatch(
                format!("centered sample {}", i),
                &[dim],
                &[sample.len()],
            ));
        }
    }

    log::debug!(
        "Computing {}x{} covariance over {} samples",
        dim,
        dim,
        samples.len()
    );

    let n = samples.len() as f64;
    let mut cov = Matrix::zeros(dim, dim);
    for i in 0..dim {
        for j in i..dim {
            let sum: f64 = samples.iter().map(|s| s[i] * s[j]).sum();
            let value = sum / n;
            cov.set(i, j, value);
            cov.set(j, i, value);
        }
    }

    Ok(cov)
}
