//! Mean-image computation and data centering
//!
//! Given a set of equally shaped images, computes the per-pixel mean image
//! and the centered dataset (each image minus the mean). The centered
//! vectors sum to zero along the sample axis.

use super::image::ImageMatrix;
use crate::error::RetrievalError;

/// Mean image plus the flattened, centered samples
#[derive(Debug, Clone, PartialEq)]
pub struct CenteredDataset {
    /// Per-pixel mean of the input images
    pub mean_image: ImageMatrix,

    /// One flattened (row-major) centered vector per input image
    pub samples: Vec<Vec<f64>>,
}

impl CenteredDataset {
    /// Number of samples (N)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Flattened dimensionality (D = height * width)
    pub fn dimension(&self) -> usize {
        self.mean_image.height() * self.mean_image.width()
    }
}

/// Compute the mean image and center every input against it
///
/// # Arguments
///
/// * `images` - Non-empty set of images sharing one shape
///
/// # Errors
///
/// Returns `EmptyInput` if `images` is empty and `ShapeMismatch` if any
/// image differs in dimensions from the first
pub fn center_images(images: &[ImageMatrix]) -> Result<CenteredDataset, RetrievalError> {
    log::debug!("Centering {} images", images.len());

    let first = images.first().ok_or_else(|| {
        RetrievalError::EmptyInput("Cannot center an empty image set".to_string())
    })?;
    let (height, width) = first.shape();

    for (i, image) in images.iter().enumerate() {
        if image.shape() != (height, width) {
            return Err(RetrievalError::shape_mismatch(
                format!("image {}", i),
                &[height, width],
                &[image.height(), image.width()],
            ));
        }
    }

    let n = images.len() as f64;
    let mut mean = vec![0.0f64; height * width];
    for image in images {
        for (acc, &px) in mean.iter_mut().zip(image.as_slice()) {
            *acc += px;
        }
    }
    for value in &mut mean {
        *value /= n;
    }

    let samples = images
        .iter()
        .map(|image| center_against(image.as_slice(), &mean))
        .collect();

    Ok(CenteredDataset {
        mean_image: ImageMatrix::new(height, width, mean)?,
        samples,
    })
}

/// Center a single image with a previously computed mean
///
/// # Errors
///
/// Returns `ShapeMismatch` if the image and the mean differ in shape
pub fn center_image(image: &ImageMatrix, mean_image: &ImageMatrix) -> Result<Vec<f64>, RetrievalError> {
    if image.shape() != mean_image.shape() {
        return Err(RetrievalError::shape_mismatch(
            "query image vs mean image",
            &[mean_image.height(), mean_image.width()],
            &[image.height(), image.width()],
        ));
    }
    Ok(center_against(image.as_slice(), mean_image.as_slice()))
}

fn center_against(pixels: &[f64], mean: &[f64]) -> Vec<f64> {
    pixels.iter().zip(mean).map(|(p, m)| p - m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(h: usize, w: usize, f: impl Fn(usize) -> f64) -> ImageMatrix {
        ImageMatrix::new(h, w, (0..h * w).map(f).collect()).unwrap()
    }

    #[test]
    fn test_center_empty() {
        assert!(matches!(
            center_images(&[]),
            Err(RetrievalError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_center_shape_mismatch() {
        let images = vec![ImageMatrix::zeros(10, 10), ImageMatrix::zeros(10, 9)];
        assert!(matches!(
            center_images(&images),
            Err(RetrievalError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_mean_image() {
        let images = vec![
            image(2, 2, |i| i as f64),
            image(2, 2, |i| 3.0 * i as f64),
        ];
        let centered = center_images(&images).unwrap();
        assert_eq!(centered.mean_image.as_slice(), &[0.0, 2.0, 4.0, 6.0]);
        assert_eq!(centered.samples[0], vec![0.0, -1.0, -2.0, -3.0]);
        assert_eq!(centered.samples[1], vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(centered.dimension(), 4);
    }

    #[test]
    fn test_centered_samples_sum_to_zero() {
        let images: Vec<ImageMatrix> = (0..7)
            .map(|k| image(5, 4, |i| ((i * 31 + k * 17) % 23) as f64 * 1.7))
            .collect();
        let centered = center_images(&images).unwrap();
        for d in 0..centered.dimension() {
            let sum: f64 = centered.samples.iter().map(|s| s[d]).sum();
            assert!(sum.abs() < 1e-9, "pixel {} sums to {}", d, sum);
        }
    }

    #[test]
    fn test_center_single_image() {
        let mean = image(2, 2, |_| 1.0);
        let query = image(2, 2, |i| i as f64);
        assert_eq!(center_image(&query, &mean).unwrap(), vec![-1.0, 0.0, 1.0, 2.0]);
        assert!(center_image(&ImageMatrix::zeros(3, 2), &mean).is_err());
    }
}
