//! Windowed histogram fingerprints of a pitch sequence

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MelodyConfig;
use crate::error::RetrievalError;
use crate::features::histogram::{
    histogram, normalize_histogram, shrink, HistogramKind, ShrinkAnchor,
};
use crate::preprocessing::pitch::{filter_rests, normalize_window};

/// ATB, RTB and FTB histograms of one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowHistograms {
    /// Absolute tone bins
    pub atb: Vec<f32>,
    /// Relative tone bins
    pub rtb: Vec<f32>,
    /// First-tone bins
    pub ftb: Vec<f32>,
}

/// Ordered per-window histogram triples describing one melody
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// One entry per window, in sequence order
    pub windows: Vec<WindowHistograms>,
}

impl FeatureSet {
    /// Number of windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// True if the melody was shorter than one window
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// ATB, RTB and FTB lengths of the first window, `None` if empty
    pub fn histogram_lengths(&self) -> Option<[usize; 3]> {
        self.windows
            .first()
            .map(|w| [w.atb.len(), w.rtb.len(), w.ftb.len()])
    }

    /// Check that this set's histograms have the given lengths
    ///
    /// An empty set matches any lengths.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the set is ragged or its lengths differ
    pub fn check_lengths(&self, expected: [usize; 3], context: &str) -> Result<(), RetrievalError> {
        self.validate_shape()?;
        match self.histogram_lengths() {
            Some(found) if found != expected => Err(RetrievalError::shape_mismatch(
                context,
                &expected,
                &found,
            )),
            _ => Ok(()),
        }
    }

    /// Check that every window uses the same histogram lengths
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` naming the first offending window
    pub fn validate_shape(&self) -> Result<(), RetrievalError> {
        let Some(first) = self.windows.first() else {
            return Ok(());
        };
        let expected = [first.atb.len(), first.rtb.len(), first.ftb.len()];
        for (i, window) in self.windows.iter().enumerate().skip(1) {
            let found = [window.atb.len(), window.rtb.len(), window.ftb.len()];
            if found != expected {
                return Err(RetrievalError::shape_mismatch(
                    format!("feature set window {}", i),
                    &expected,
                    &found,
                ));
            }
        }
        Ok(())
    }
}

/// Extract a melody fingerprint from a pitch sequence
///
/// Rests are dropped first, then windows of `window_size` pitches are taken
/// every `hop_size` pitches. Each window is normalized, histogrammed,
/// optionally shrunk and finally scaled per `histogram.normalization`.
///
/// # Arguments
///
/// * `sequence` - Per-quantum pitches, `None` for rests
/// * `config` - Melody configuration
///
/// # Returns
///
/// Feature set with `floor((n - window) / hop) + 1` windows, where `n` is the
/// number of non-rest pitches; empty if `n < window_size`
///
/// # Errors
///
/// Returns `InvalidInput` if the configuration is unusable
pub fn extract_features(
    sequence: &[Option<u8>],
    config: &MelodyConfig,
) -> Result<FeatureSet, RetrievalError> {
    config.validate()?;

    let pitches = filter_rests(sequence);
    log::debug!(
        "Extracting melody features: {} quanta, {} notes, window={}, hop={}",
        sequence.len(),
        pitches.len(),
        config.window_size,
        config.hop_size
    );

    if pitches.len() < config.window_size {
        log::debug!("Sequence shorter than one window, returning empty feature set");
        return Ok(FeatureSet::default());
    }

    let windows = (0..=pitches.len() - config.window_size)
        .step_by(config.hop_size)
        .map(|start| window_histograms(&pitches[start..start + config.window_size], config))
        .collect();

    Ok(FeatureSet { windows })
}

/// Extract fingerprints for many sequences in parallel
///
/// Output order matches input order.
pub fn extract_features_batch(
    sequences: &[Vec<Option<u8>>],
    config: &MelodyConfig,
) -> Result<Vec<FeatureSet>, RetrievalError> {
    config.validate()?;
    sequences
        .par_iter()
        .map(|sequence| extract_features(sequence, config))
        .collect()
}

fn window_histograms(window: &[u8], config: &MelodyConfig) -> WindowHistograms {
    let normalized = normalize_window(window, config.pitch_normalization);
    let build = |kind: HistogramKind, anchor: ShrinkAnchor| {
        let mut hist = histogram(kind, &normalized, &config.histogram);
        if let Some(bounds) = config.shrink.map(|s| match kind {
            HistogramKind::Atb => s.atb,
            HistogramKind::Rtb => s.rtb,
            HistogramKind::Ftb => s.ftb,
        }) {
            hist = shrink(&hist, anchor, bounds);
        }
        normalize_histogram(&mut hist, config.histogram.normalization);
        hist
    };

    WindowHistograms {
        atb: build(HistogramKind::Atb, ShrinkAnchor::WeightedMean),
        rtb: build(HistogramKind::Rtb, ShrinkAnchor::Center),
        ftb: build(HistogramKind::Ftb, ShrinkAnchor::Center),
    }
}
