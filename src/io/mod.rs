//! I/O collaborators
//!
//! Image decoding (feature `image-decoding`) and the record store seam.

#[cfg(feature = "image-decoding")]
pub mod decoder;
pub mod store;
