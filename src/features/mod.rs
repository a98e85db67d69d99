//! Feature extraction modules
//!
//! This module contains the embedding and fingerprinting algorithms:
//! - PCA image space (covariance, power iteration, projection)
//! - Fuzzy pitch/interval histograms
//! - Melody feature sets and similarity

pub mod histogram;
pub mod melody;
pub mod pca;
