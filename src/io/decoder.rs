//! Image decoding using the `image` crate

use std::path::Path;

use crate::error::RetrievalError;
use crate::preprocessing::image::{resize_nearest, to_grayscale, ImageMatrix};

/// Decode encoded image bytes into a fixed-size grayscale matrix
///
/// # Arguments
///
/// * `bytes` - PNG or JPEG file contents
/// * `height` - Target height
/// * `width` - Target width
///
/// # Returns
///
/// `height x width` luminance matrix with values in `[0, 255]`
///
/// # Errors
///
/// Returns `DecodingError` if the bytes are not a supported image and
/// `InvalidInput` for a zero target size
pub fn decode_image(bytes: &[u8], height: usize, width: usize) -> Result<ImageMatrix, RetrievalError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| RetrievalError::DecodingError(format!("Failed to decode image: {}", e)))?;
    let rgb = decoded.to_rgb8();
    let (src_width, src_height) = (rgb.width() as usize, rgb.height() as usize);
    log::debug!(
        "Decoded {}x{} image, resizing to {}x{}",
        src_height,
        src_width,
        height,
        width
    );

    let gray = to_grayscale(rgb.as_raw(), src_height, src_width, 3)?;
    resize_nearest(&gray, height, width)
}

/// Read and decode an image file
///
/// # Errors
///
/// Returns `DecodingError` if the file cannot be read or decoded
pub fn decode_image_file<P: AsRef<Path>>(
    path: P,
    height: usize,
    width: usize,
) -> Result<ImageMatrix, RetrievalError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        RetrievalError::DecodingError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    decode_image(&bytes, height, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(img: image::RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_uniform_gray() {
        let img = image::RgbImage::from_pixel(6, 4, image::Rgb([100, 100, 100]));
        let matrix = decode_image(&encode_png(img), 2, 3).unwrap();
        assert_eq!(matrix.shape(), (2, 3));
        for &v in matrix.as_slice() {
            // Luminance weights sum to 0.9999
            assert!((v - 100.0).abs() < 0.05);
        }
    }

    #[test]
    fn test_decode_uses_luminance() {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]));
        let matrix = decode_image(&encode_png(img), 2, 2).unwrap();
        assert!((matrix.get(0, 0) - 0.2989 * 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_image(b"not an image", 4, 4),
            Err(RetrievalError::DecodingError(_))
        ));
    }

    #[test]
    fn test_decode_missing_file() {
        assert!(matches!(
            decode_image_file("/nonexistent/cover.png", 4, 4),
            Err(RetrievalError::DecodingError(_))
        ));
    }
}
