//! Dense row-major matrix used by the PCA engine

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Dense `rows x cols` matrix of `f64`, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unchecked serialized layout of a [`Matrix`]
#[derive(Deserialize)]
struct MatrixParts {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<MatrixParts> for Matrix {
    type Error = RetrievalError;

    fn try_from(parts: MatrixParts) -> Result<Self, Self::Error> {
        Self::new(parts.rows, parts.cols, parts.data)
    }
}

impl Matrix {
    /// Build from row-major data
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `data.len() != rows * cols`
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, RetrievalError> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(RetrievalError::shape_mismatch(
                "matrix data",
                &[rows.saturating_mul(cols)],
                &[data.len()],
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// All-zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows (row-major nested arrays)
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the rows are ragged
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, RetrievalError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(RetrievalError::shape_mismatch(
                    format!("matrix row {}", i),
                    &[cols],
                    &[row.len()],
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Build a matrix whose columns are the given vectors
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the columns differ in length
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, RetrievalError> {
        let rows = columns.first().map_or(0, Vec::len);
        let cols = columns.len();
        let mut matrix = Self::zeros(rows, cols);
        for (j, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(RetrievalError::shape_mismatch(
                    format!("matrix column {}", j),
                    &[rows],
                    &[column.len()],
                ));
            }
            for (i, &value) in column.iter().enumerate() {
                matrix.set(i, j, value);
            }
        }
        Ok(matrix)
    }

    /// Nested row representation
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(i, j)`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Overwrite element `(i, j)`
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Column `j` copied out
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    /// Matrix-vector product `A * v`
    ///
    /// Caller guarantees `v.len() == cols`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.cols);
        (0..self.rows).map(|i| dot(self.row(i), v)).collect()
    }

    /// Subtract `scale * v * v^T` in place (square matrices only)
    pub fn subtract_outer(&mut self, scale: f64, v: &[f64]) {
        debug_assert_eq!(self.rows, self.cols);
        debug_assert_eq!(v.len(), self.rows);
        for i in 0..self.rows {
            let vi = scale * v[i];
            let row = &mut self.data[i * self.cols..(i + 1) * self.cols];
            for (cell, &vj) in row.iter_mut().zip(v) {
                *cell -= vi * vj;
            }
        }
    }

    /// Check symmetry within an absolute tolerance
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        if self.rows != self.cols {
            return false;
        }
        (0..self.rows).all(|i| (i + 1..self.cols).all(|j| (self.get(i, j) - self.get(j, i)).abs() <= tolerance))
    }
}

/// Dot product of two equal-length slices
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm
#[inline]
pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_and_back() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let m = Matrix::from_rows(&rows).unwrap();
        assert_eq!((m.rows(), m.cols()), (3, 2));
        assert_eq!(m.get(2, 1), 6.0);
        assert_eq!(m.column(0), vec![1.0, 3.0, 5.0]);
        assert_eq!(m.to_rows(), rows);
    }

    #[test]
    fn test_from_columns() {
        let m = Matrix::from_columns(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.row(0), &[1.0, 3.0]);
        assert_eq!(m.row(1), &[2.0, 4.0]);
        assert!(Matrix::from_columns(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_mul_vec() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.mul_vec(&[1.0, 1.0]), vec![3.0, 7.0]);
    }

    #[test]
    fn test_subtract_outer() {
        let mut m = Matrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 1.0]]).unwrap();
        m.subtract_outer(2.0, &[1.0, 0.0]);
        assert_eq!(m.to_rows(), vec![vec![0.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_is_symmetric() {
        let sym = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        let asym = Matrix::from_rows(&[vec![1.0, 2.0], vec![0.0, 1.0]]).unwrap();
        assert!(sym.is_symmetric(1e-12));
        assert!(!asym.is_symmetric(1e-12));
    }

    #[test]
    fn test_new_checks_length() {
        assert!(Matrix::new(2, 3, vec![0.0; 6]).is_ok());
        assert!(matches!(
            Matrix::new(3, 1, Vec::new()),
            Err(RetrievalError::ShapeMismatch { .. })
        ));
        assert!(Matrix::new(usize::MAX, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_deserialize_checks_length() {
        let m: Matrix = serde_json::from_str(r#"{"rows":1,"cols":2,"data":[1.0,2.0]}"#).unwrap();
        assert_eq!(m.row(0), &[1.0, 2.0]);
        let bad = serde_json::from_str::<Matrix>(r#"{"rows":3,"cols":1,"data":[]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_dot_and_norm() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
    }
}
