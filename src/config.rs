//! Configuration parameters for image embedding and melody fingerprinting

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;
use crate::features::histogram::{HistogramConfig, ShrinkConfig, ATB_BINS, INTERVAL_BINS};
use crate::features::melody::similarity::{ScoreAggregation, SimilarityWeights};
use crate::preprocessing::pitch::PitchNormalization;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Image space (PCA) parameters
    pub image: ImageConfig,

    /// Melody fingerprint parameters
    pub melody: MelodyConfig,
}

impl RetrievalConfig {
    /// Check every parameter for usable values
    pub fn validate(&self) -> Result<(), RetrievalError> {
        self.image.validate()?;
        self.melody.validate()
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, RetrievalError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| RetrievalError::SerializationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// PCA image space parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Target height after resize (default: 20)
    pub height: usize,

    /// Target width after resize (default: 20)
    pub width: usize,

    /// Number of principal components to keep (default: 5)
    pub components: usize,

    /// Maximum power-iteration steps per eigenpair (default: 100)
    pub max_iterations: usize,

    /// Convergence tolerance on the change of the iterate (default: 1e-6)
    pub tolerance: f64,

    /// Seed for the random starting vector (default: None)
    ///
    /// `None` seeds from entropy, so repeated fits may return eigenvectors
    /// with flipped signs or, for near-equal eigenvalues, a different basis
    /// of the same subspace. Fix the seed for reproducible output.
    pub seed: Option<u64>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            height: 20,
            width: 20,
            components: 5,
            max_iterations: 100,
            tolerance: 1e-6,
            seed: None,
        }
    }
}

impl ImageConfig {
    /// Check image parameters
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.height == 0 || self.width == 0 {
            return Err(RetrievalError::InvalidInput(format!(
                "Image resolution must be non-zero, got {}x{}",
                self.height, self.width
            )));
        }
        if self.components == 0 {
            return Err(RetrievalError::InvalidInput(
                "Number of components must be at least 1".to_string(),
            ));
        }
        self.validate_solver()
    }

    /// Check only the power-iteration limits
    ///
    /// Used when the resolution and component count come from elsewhere.
    pub fn validate_solver(&self) -> Result<(), RetrievalError> {
        if self.max_iterations == 0 {
            return Err(RetrievalError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(RetrievalError::InvalidInput(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Melody fingerprint parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyConfig {
    /// Window length in pitch quanta (default: 40)
    pub window_size: usize,

    /// Hop between consecutive windows (default: 8)
    pub hop_size: usize,

    /// How window pitches are mapped before histogramming (default: MeanCentered)
    pub pitch_normalization: PitchNormalization,

    /// Fuzzy histogram parameters
    pub histogram: HistogramConfig,

    /// Optional truncation of each histogram (default: None, keep full length)
    pub shrink: Option<ShrinkConfig>,

    /// Per-histogram weights used when scoring (default: 0.3 / 0.5 / 0.2)
    pub weights: SimilarityWeights,

    /// How window-pair similarities combine into one score (default: Max)
    pub aggregation: ScoreAggregation,
}

impl Default for MelodyConfig {
    fn default() -> Self {
        Self {
            window_size: 40,
            hop_size: 8,
            pitch_normalization: PitchNormalization::MeanCentered,
            histogram: HistogramConfig::default(),
            shrink: None,
            weights: SimilarityWeights::default(),
            aggregation: ScoreAggregation::Max,
        }
    }
}

impl MelodyConfig {
    /// Check melody parameters
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.window_size == 0 {
            return Err(RetrievalError::InvalidInput(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.hop_size == 0 {
            return Err(RetrievalError::InvalidInput(
                "hop_size must be at least 1".to_string(),
            ));
        }
        if let PitchNormalization::ZScore { spread } = self.pitch_normalization {
            if !(spread > 0.0) {
                return Err(RetrievalError::InvalidInput(format!(
                    "ZScore spread must be positive, got {}",
                    spread
                )));
            }
        }
        self.histogram.validate()?;
        self.weights.validate()
    }

    /// ATB, RTB and FTB lengths of the histograms this configuration produces
    pub fn histogram_lengths(&self) -> [usize; 3] {
        match self.shrink {
            Some(shrink) => [
                shrink.atb.target_len(),
                shrink.rtb.target_len(),
                shrink.ftb.target_len(),
            ],
            None => [ATB_BINS, INTERVAL_BINS, INTERVAL_BINS],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RetrievalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_hop_rejected() {
        let mut config = RetrievalConfig::default();
        config.melody.hop_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_components_rejected() {
        let mut config = RetrievalConfig::default();
        config.image.components = 0;
        assert!(matches!(
            config.validate(),
            Err(RetrievalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            RetrievalConfig::from_json(r#"{"image": {"height": 10, "width": 10, "seed": 7}}"#)
                .unwrap();
        assert_eq!(config.image.height, 10);
        assert_eq!(config.image.seed, Some(7));
        assert_eq!(config.image.components, 5);
        assert_eq!(config.melody.window_size, 40);
    }

    #[test]
    fn test_from_json_invalid_values() {
        let result = RetrievalConfig::from_json(r#"{"melody": {"window_size": 0}}"#);
        assert!(result.is_err());
    }
}
