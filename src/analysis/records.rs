//! Persistence records
//!
//! Stored forms of a fitted image space and of a melody fingerprint. All
//! arrays are nested, row-major numeric sequences so any JSON or document
//! store can hold them without a custom codec.

use serde::{Deserialize, Serialize};

use super::result::ImageSpace;
use crate::error::RetrievalError;
use crate::features::melody::{FeatureSet, WindowHistograms};
use crate::features::pca::Matrix;
use crate::preprocessing::image::ImageMatrix;

/// Stored form of an [`ImageSpace`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpaceRecord {
    /// `H x W` mean image
    pub mean_image: Vec<Vec<f64>>,
    /// `D x k` basis (`Uk`)
    pub basis: Vec<Vec<f64>>,
    /// `k` eigenvalues, descending
    pub eigenvalues: Vec<f64>,
    /// `N x k` projections
    pub projections: Vec<Vec<f64>>,
}

impl From<&ImageSpace> for ImageSpaceRecord {
    fn from(space: &ImageSpace) -> Self {
        Self {
            mean_image: space.mean_image.to_rows(),
            basis: space.basis.to_rows(),
            eigenvalues: space.eigenvalues.clone(),
            projections: space.projections.to_rows(),
        }
    }
}

impl ImageSpaceRecord {
    /// Rebuild the image space, checking every shape
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` for ragged arrays or inconsistent dimensions
    pub fn into_image_space(self) -> Result<ImageSpace, RetrievalError> {
        let mean_image = ImageMatrix::from_rows(&self.mean_image)?;
        let mut basis = Matrix::from_rows(&self.basis)?;
        if basis.rows() == 0 {
            // Zero rows lose the column count; recover it from the eigenvalues
            basis = Matrix::zeros(0, self.eigenvalues.len());
        }
        let mut projections = Matrix::from_rows(&self.projections)?;
        if projections.rows() == 0 {
            projections = Matrix::zeros(0, basis.cols());
        }
        let space = ImageSpace {
            mean_image,
            basis,
            eigenvalues: self.eigenvalues,
            projections,
        };
        space.validate()?;
        Ok(space)
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, RetrievalError> {
        serde_json::to_string(self).map_err(|e| RetrievalError::SerializationError(e.to_string()))
    }

    /// Parse from JSON text
    pub fn from_json(text: &str) -> Result<Self, RetrievalError> {
        serde_json::from_str(text).map_err(|e| RetrievalError::SerializationError(e.to_string()))
    }
}

/// Stored form of a named melody fingerprint
///
/// `feature_set[window]` holds `[atb, rtb, ftb]` bin arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyRecord {
    /// Melody name (track title, file name, ...)
    pub name: String,
    /// Per-window histogram triples
    pub feature_set: Vec<Vec<Vec<f32>>>,
}

impl MelodyRecord {
    /// Build a record from a feature set
    pub fn new(name: impl Into<String>, feature_set: &FeatureSet) -> Self {
        Self {
            name: name.into(),
            feature_set: feature_set
                .windows
                .iter()
                .map(|w| vec![w.atb.clone(), w.rtb.clone(), w.ftb.clone()])
                .collect(),
        }
    }

    /// Rebuild the feature set
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a window does not hold exactly three
    /// histograms or window lengths disagree
    pub fn to_feature_set(&self) -> Result<FeatureSet, RetrievalError> {
        let windows = self
            .feature_set
            .iter()
            .enumerate()
            .map(|(i, triple)| match triple.as_slice() {
                [atb, rtb, ftb] => Ok(WindowHistograms {
                    atb: atb.clone(),
                    rtb: rtb.clone(),
                    ftb: ftb.clone(),
                }),
                _ => Err(RetrievalError::shape_mismatch(
                    format!("melody record '{}' window {}", self.name, i),
                    &[3],
                    &[triple.len()],
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let feature_set = FeatureSet { windows };
        feature_set.validate_shape()?;
        Ok(feature_set)
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, RetrievalError> {
        serde_json::to_string(self).map_err(|e| RetrievalError::SerializationError(e.to_string()))
    }

    /// Parse from JSON text
    pub fn from_json(text: &str) -> Result<Self, RetrievalError> {
        serde_json::from_str(text).map_err(|e| RetrievalError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> ImageSpace {
        ImageSpace {
            mean_image: ImageMatrix::new(2, 2, vec![0.5, 1.0, 1.5, 2.0]).unwrap(),
            basis: Matrix::from_columns(&[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 0.0, 1.0, 0.0]])
                .unwrap(),
            eigenvalues: vec![3.0, 1.0],
            projections: Matrix::from_rows(&[vec![1.0, -1.0], vec![-1.0, 1.0]]).unwrap(),
        }
    }

    #[test]
    fn test_image_record_nested_layout() {
        let record = ImageSpaceRecord::from(&space());
        assert_eq!(record.mean_image, vec![vec![0.5, 1.0], vec![1.5, 2.0]]);
        assert_eq!(record.basis.len(), 4);
        assert_eq!(record.basis[2], vec![0.0, 1.0]);
    }

    #[test]
    fn test_image_record_through_json() {
        let fitted = space();
        let json = ImageSpaceRecord::from(&fitted).to_json().unwrap();
        let restored = ImageSpaceRecord::from_json(&json)
            .unwrap()
            .into_image_space()
            .unwrap();
        assert_eq!(restored, fitted);
    }

    #[test]
    fn test_image_record_inconsistent_basis() {
        let mut record = ImageSpaceRecord::from(&space());
        record.basis.pop();
        assert!(matches!(
            record.into_image_space(),
            Err(RetrievalError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_image_record_bad_json() {
        assert!(matches!(
            ImageSpaceRecord::from_json("{\"mean_image\": 3}"),
            Err(RetrievalError::SerializationError(_))
        ));
    }

    #[test]
    fn test_melody_record_layout() {
        let fs = FeatureSet {
            windows: vec![WindowHistograms {
                atb: vec![1.0],
                rtb: vec![2.0, 3.0],
                ftb: vec![4.0, 5.0],
            }],
        };
        let record = MelodyRecord::new("tune", &fs);
        assert_eq!(record.feature_set, vec![vec![vec![1.0], vec![2.0, 3.0], vec![4.0, 5.0]]]);
        let json = record.to_json().unwrap();
        let back = MelodyRecord::from_json(&json).unwrap();
        assert_eq!(back.to_feature_set().unwrap(), fs);
    }

    #[test]
    fn test_melody_record_missing_histogram() {
        let record = MelodyRecord {
            name: "broken".to_string(),
            feature_set: vec![vec![vec![1.0], vec![1.0]]],
        };
        assert!(record.to_feature_set().is_err());
    }
}
