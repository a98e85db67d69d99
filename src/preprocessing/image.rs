//! Grayscale image matrices
//!
//! Conversion of raw pixel buffers into fixed-size grayscale matrices:
//! - Luminance conversion (ITU-R BT.601 weights)
//! - Nearest-neighbour resizing
//! - Row-major flattening

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Luminance weights for R, G, B (ITU-R BT.601)
const LUMA_WEIGHTS: [f64; 3] = [0.2989, 0.5870, 0.1140];

/// A 2D grid of grayscale intensities stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ImageParts")]
pub struct ImageMatrix {
    height: usize,
    width: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct ImageParts {
    height: usize,
    width: usize,
    data: Vec<f64>,
}

impl TryFrom<ImageParts> for ImageMatrix {
    type Error = RetrievalError;

    fn try_from(parts: ImageParts) -> Result<Self, Self::Error> {
        Self::new(parts.height, parts.width, parts.data)
    }
}

impl ImageMatrix {
    /// Build an image from row-major pixel data
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `data.len() != height * width`
    pub fn new(height: usize, width: usize, data: Vec<f64>) -> Result<Self, RetrievalError> {
        if height.checked_mul(width) != Some(data.len()) {
            return Err(RetrievalError::shape_mismatch(
                "image pixel buffer",
                &[height.saturating_mul(width)],
                &[data.len()],
            ));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// All-zero image
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            data: vec![0.0; height * width],
        }
    }

    /// Build an image from nested rows
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the rows are ragged
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, RetrievalError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(height * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(RetrievalError::shape_mismatch(
                    format!("image row {}", i),
                    &[width],
                    &[row.len()],
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Nested row representation
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.data.chunks(self.width).map(<[f64]>::to_vec).collect()
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Pixel at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    /// Row-major flattened view (length `height * width`)
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major view
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume into the flattened row-major vector
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// Convert an interleaved 8-bit pixel buffer to grayscale
///
/// Accepts 1 (gray), 3 (RGB) or 4 (RGBA, alpha ignored) channels.
///
/// # Arguments
///
/// * `pixels` - Interleaved pixel bytes, row-major
/// * `height` - Image height in pixels
/// * `width` - Image width in pixels
/// * `channels` - Channels per pixel
///
/// # Errors
///
/// Returns `InvalidInput` for an unsupported channel count and
/// `ShapeMismatch` if the buffer length does not match the dimensions
pub fn to_grayscale(
    pixels: &[u8],
    height: usize,
    width: usize,
    channels: usize,
) -> Result<ImageMatrix, RetrievalError> {
    if !matches!(channels, 1 | 3 | 4) {
        return Err(RetrievalError::InvalidInput(format!(
            "Unsupported channel count {}, expected 1, 3 or 4",
            channels
        )));
    }
    let expected = height * width * channels;
    if pixels.len() != expected {
        return Err(RetrievalError::shape_mismatch(
            "pixel buffer",
            &[height, width, channels],
            &[pixels.len()],
        ));
    }

    let data = if channels == 1 {
        pixels.iter().map(|&p| p as f64).collect()
    } else {
        pixels
            .chunks_exact(channels)
            .map(|px| {
                LUMA_WEIGHTS[0] * px[0] as f64
                    + LUMA_WEIGHTS[1] * px[1] as f64
                    + LUMA_WEIGHTS[2] * px[2] as f64
            })
            .collect()
    };

    ImageMatrix::new(height, width, data)
}

/// Resize an image with nearest-neighbour sampling
///
/// Output pixel `(i, j)` takes source pixel
/// `(floor(i * in_h / out_h), floor(j * in_w / out_w))`.
///
/// # Errors
///
/// Returns `InvalidInput` if either the source or the target size is zero
pub fn resize_nearest(
    image: &ImageMatrix,
    out_height: usize,
    out_width: usize,
) -> Result<ImageMatrix, RetrievalError> {
    if out_height == 0 || out_width == 0 {
        return Err(RetrievalError::InvalidInput(format!(
            "Target size must be non-zero, got {}x{}",
            out_height, out_width
        )));
    }
    let (in_height, in_width) = image.shape();
    if in_height == 0 || in_width == 0 {
        return Err(RetrievalError::InvalidInput(
            "Cannot resize an empty image".to_string(),
        ));
    }

    let row_ratio = in_height as f64 / out_height as f64;
    let col_ratio = in_width as f64 / out_width as f64;

    let mut data = Vec::with_capacity(out_height * out_width);
    for i in 0..out_height {
        let src_row = ((i as f64 * row_ratio) as usize).min(in_height - 1);
        for j in 0..out_width {
            let src_col = ((j as f64 * col_ratio) as usize).min(in_width - 1);
            data.push(image.get(src_row, src_col));
        }
    }

    ImageMatrix::new(out_height, out_width, data)
}
