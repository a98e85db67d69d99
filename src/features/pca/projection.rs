//! Projection of centered data onto a PCA basis

use super::matrix::{dot, Matrix};
use super::power_iteration::Eigenpair;
use crate::error::RetrievalError;

/// Stack eigenvectors as the columns of a `D x k` basis (`Uk`)
///
/// # Errors
///
/// Returns `EmptyInput` for zero eigenpairs and `ShapeMismatch` if the
/// eigenvectors differ in length
pub fn basis_from_eigenpairs(pairs: &[Eigenpair]) -> Result<Matrix, RetrievalError> {
    if pairs.is_empty() {
        return Err(RetrievalError::EmptyInput(
            "Cannot build a basis from zero eigenpairs".to_string(),
        ));
    }
    let columns: Vec<Vec<f64>> = pairs.iter().map(|p| p.eigenvector.clone()).collect();
    Matrix::from_columns(&columns)
}

/// Project one centered, flattened item onto the basis
///
/// # Returns
///
/// Length-`k` coordinate vector (`x . Uk`)
///
/// # Errors
///
/// Returns `ShapeMismatch` if `centered.len()` differs from the basis rows
pub fn project(centered: &[f64], basis: &Matrix) -> Result<Vec<f64>, RetrievalError> {
    if centered.len() != basis.rows() {
        return Err(RetrievalError::shape_mismatch(
            "projection input vs basis rows",
            &[basis.rows()],
            &[centered.len()],
        ));
    }
    Ok((0..basis.cols())
        .map(|j| dot(centered, &basis.column(j)))
        .collect())
}

/// Project a batch of centered items
///
/// # Returns
///
/// `N x k` projection matrix, one row per item
pub fn project_batch(samples: &[Vec<f64>], basis: &Matrix) -> Result<Matrix, RetrievalError> {
    // Columns copied once instead of per sample
    let columns: Vec<Vec<f64>> = (0..basis.cols()).map(|j| basis.column(j)).collect();

    let mut out = Matrix::zeros(samples.len(), basis.cols());
    for (i, sample) in samples.iter().enumerate() {
        if sample.len() != basis.rows() {
            return Err(RetrievalError::shape_mismatch(
                format!("projection input {} vs basis rows", i),
                &[basis.rows()],
                &[sample.len()],
            ));
        }
        for (j, column) in columns.iter().enumerate() {
            out.set(i, j, dot(sample, column));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_basis() -> Matrix {
        // Columns: e0, e2 in R^3
        Matrix::from_columns(&[vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_project_single() {
        let z = project(&[3.0, 4.0, 5.0], &axis_basis()).unwrap();
        assert_eq!(z, vec![3.0, 5.0]);
    }

    #[test]
    fn test_project_dimension_mismatch() {
        assert!(matches!(
            project(&[1.0, 2.0], &axis_basis()),
            Err(RetrievalError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_project_batch() {
        let samples = vec![vec![1.0, 2.0, 3.0], vec![-1.0, 0.0, 1.0]];
        let z = project_batch(&samples, &axis_basis()).unwrap();
        assert_eq!(z.to_rows(), vec![vec![1.0, 3.0], vec![-1.0, 1.0]]);
    }

    #[test]
    fn test_basis_from_eigenpairs() {
        let pairs = vec![
            Eigenpair {
                eigenvalue: 2.0,
                eigenvector: vec![1.0, 0.0],
            },
            Eigenpair {
                eigenvalue: 1.0,
                eigenvector: vec![0.0, 1.0],
            },
        ];
        let basis = basis_from_eigenpairs(&pairs).unwrap();
        assert_eq!(basis.column(0), vec![1.0, 0.0]);
        assert_eq!(basis.column(1), vec![0.0, 1.0]);
        assert!(basis_from_eigenpairs(&[]).is_err());
    }
}
