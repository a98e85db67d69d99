//! Fuzzy histogram engine
//!
//! Turns a window of pitches into fixed-length histograms:
//! - ATB / RTB / FTB encodings with fuzzy neighbour spreading
//! - Truncation around an anchor bin (shrink)
//! - Normalization strategies

pub mod fuzzy;
pub mod shrink;

pub use fuzzy::{
    atb_histogram, ftb_histogram, histogram, rtb_histogram, HistogramKind, ATB_BINS,
    INTERVAL_BINS, INTERVAL_CENTER,
};
pub use shrink::{shrink, ShrinkAnchor, ShrinkBounds, ShrinkConfig};

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Largest fuzzy radius; it already reaches across the whole interval range
pub const MAX_FUZZY_RADIUS: usize = INTERVAL_CENTER;

/// How a finished histogram is scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistogramNormalization {
    /// Keep raw (fuzzy) mass
    None,
    /// Scale so the bins sum to 1; all-zero histograms stay zero
    UnitSum,
}

/// Fuzzy histogram parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Neighbour radius for fuzzy spreading in bins, at most
    /// [`MAX_FUZZY_RADIUS`] (default: 2)
    pub n_semitones: usize,

    /// Weight decay across the radius, 0 = flat, 1 = zero at the edge (default: 0.5)
    pub fuzziness: f32,

    /// Scaling applied after shrinking (default: UnitSum)
    pub normalization: HistogramNormalization,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            n_semitones: 2,
            fuzziness: 0.5,
            normalization: HistogramNormalization::UnitSum,
        }
    }
}

impl HistogramConfig {
    /// Check histogram parameters
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.n_semitones > MAX_FUZZY_RADIUS {
            return Err(RetrievalError::InvalidInput(format!(
                "n_semitones must be at most {}, got {}",
                MAX_FUZZY_RADIUS, self.n_semitones
            )));
        }
        if !(0.0..=1.0).contains(&self.fuzziness) {
            return Err(RetrievalError::InvalidInput(format!(
                "fuzziness must be within [0, 1], got {}",
                self.fuzziness
            )));
        }
        Ok(())
    }
}

/// Scale a histogram in place
pub fn normalize_histogram(histogram: &mut [f32], mode: HistogramNormalization) {
    match mode {
        HistogramNormalization::None => {}
        HistogramNormalization::UnitSum => {
            let total: f32 = histogram.iter().sum();
            if total > 0.0 {
                for bin in histogram.iter_mut() {
                    *bin /= total;
                }
            }
        }
    }
}
