//! Result types for fitting and ranking

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;
use crate::features::pca::{project, Matrix};
use crate::preprocessing::centering::center_image;
use crate::preprocessing::image::ImageMatrix;

/// A fitted PCA image space
///
/// Everything needed to project new images and rank them against the
/// images the space was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ImageSpaceParts")]
pub struct ImageSpace {
    /// Per-pixel mean of the fitted images
    pub mean_image: ImageMatrix,

    /// `D x k` eigenvector basis (`Uk`), `D = height * width`
    pub basis: Matrix,

    /// Eigenvalues in descending order (length `k`)
    ///
    /// Values near zero mark components that carry no variance.
    pub eigenvalues: Vec<f64>,

    /// `N x k` projections of the fitted images, one row per image
    pub projections: Matrix,
}

/// Unchecked serialized layout of an [`ImageSpace`]
#[derive(Deserialize)]
struct ImageSpaceParts {
    mean_image: ImageMatrix,
    basis: Matrix,
    eigenvalues: Vec<f64>,
    projections: Matrix,
}

impl TryFrom<ImageSpaceParts> for ImageSpace {
    type Error = RetrievalError;

    fn try_from(parts: ImageSpaceParts) -> Result<Self, Self::Error> {
        let space = Self {
            mean_image: parts.mean_image,
            basis: parts.basis,
            eigenvalues: parts.eigenvalues,
            projections: parts.projections,
        };
        space.validate()?;
        Ok(space)
    }
}

impl ImageSpace {
    /// Number of principal components (k)
    pub fn components(&self) -> usize {
        self.basis.cols()
    }

    /// Number of fitted images (N)
    pub fn len(&self) -> usize {
        self.projections.rows()
    }

    /// True if the space holds no images
    pub fn is_empty(&self) -> bool {
        self.projections.rows() == 0
    }

    /// Center an image with the stored mean and project it onto the basis
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the image resolution differs from the
    /// mean image
    pub fn project(&self, image: &ImageMatrix) -> Result<Vec<f64>, RetrievalError> {
        let centered = center_image(image, &self.mean_image)?;
        project(&centered, &self.basis)
    }

    /// Check internal consistency of the stored arrays
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the basis rows differ from the pixel
    /// count, or the eigenvalue count and projection width differ from the
    /// basis columns
    pub fn validate(&self) -> Result<(), RetrievalError> {
        let (height, width) = self.mean_image.shape();
        if self.basis.rows() != height * width {
            return Err(RetrievalError::shape_mismatch(
                "basis rows vs mean image pixels",
                &[height * width],
                &[self.basis.rows()],
            ));
        }
        if self.eigenvalues.len() != self.basis.cols() {
            return Err(RetrievalError::shape_mismatch(
                "eigenvalue count vs basis columns",
                &[self.basis.cols()],
                &[self.eigenvalues.len()],
            ));
        }
        if self.projections.rows() > 0 && self.projections.cols() != self.basis.cols() {
            return Err(RetrievalError::shape_mismatch(
                "projection width vs basis columns",
                &[self.basis.cols()],
                &[self.projections.cols()],
            ));
        }
        Ok(())
    }
}

/// One ranked image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageMatch {
    /// Row of the stored projection
    pub index: usize,

    /// Euclidean distance to the query projection
    pub distance: f64,

    /// `(1 - distance / max_distance) * 100`, in `[0, 100]`
    pub similarity_percentage: f64,
}

/// One ranked melody
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelodyMatch {
    /// Position of the stored feature set
    pub index: usize,

    /// Aggregated similarity, higher is closer
    pub score: f32,
}

impl MelodyMatch {
    /// `1 - score`, for callers that order by distance
    pub fn pseudo_distance(&self) -> f32 {
        1.0 - self.score
    }
}

/// A ranked image from a named catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedImageMatch {
    /// Catalog entry name
    pub name: String,

    /// Ranking details
    #[serde(flatten)]
    pub result: ImageMatch,
}

/// A ranked melody from a named catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedMelodyMatch {
    /// Catalog entry name
    pub name: String,

    /// Ranking details
    #[serde(flatten)]
    pub result: MelodyMatch,
}
