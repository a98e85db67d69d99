//! Input preprocessing modules
//!
//! This module contains utilities for preparing raw inputs for analysis:
//! - Grayscale conversion and resizing of images
//! - Mean-centering of image datasets
//! - Pitch sequence cleanup, quantization and window normalization

pub mod centering;
pub mod image;
pub mod pitch;
