//! Named collections of fitted images and melody fingerprints
//!
//! A catalog owns its stored items plus the configuration they were built
//! with, so queries are always processed the same way as the stored items.

use super::ranking::{rank_feature_sets, rank_projections};
use super::records::{ImageSpaceRecord, MelodyRecord};
use super::result::{ImageSpace, NamedImageMatch, NamedMelodyMatch};
use crate::config::{ImageConfig, MelodyConfig};
use crate::error::RetrievalError;
use crate::features::melody::{extract_features, extract_features_batch, FeatureSet};
use crate::preprocessing::image::{resize_nearest, ImageMatrix};

/// Images embedded in one PCA space, addressable by name
#[derive(Debug, Clone)]
pub struct ImageCatalog {
    names: Vec<String>,
    space: ImageSpace,
    config: ImageConfig,
}

impl ImageCatalog {
    /// Fit an image space over named images
    ///
    /// Images whose size differs from the configured resolution are resized
    /// with nearest-neighbour sampling first.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` for no images and `InvalidInput` for an unusable
    /// configuration or a component count above the pixel count
    pub fn build(entries: Vec<(String, ImageMatrix)>, config: &ImageConfig) -> Result<Self, RetrievalError> {
        config.validate()?;
        log::debug!("Building image catalog from {} images", entries.len());

        let mut names = Vec::with_capacity(entries.len());
        let mut images = Vec::with_capacity(entries.len());
        for (name, image) in entries {
            images.push(to_resolution(&image, config)?);
            names.push(name);
        }

        let space = crate::fit_image_space(&images, config.components, config)?;
        Ok(Self {
            names,
            space,
            config: config.clone(),
        })
    }

    /// Restore a catalog from a stored image space
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the record is inconsistent or the number
    /// of names differs from the number of stored projections
    pub fn from_record(
        names: Vec<String>,
        record: ImageSpaceRecord,
        config: &ImageConfig,
    ) -> Result<Self, RetrievalError> {
        config.validate()?;
        let space = record.into_image_space()?;
        if names.len() != space.len() {
            return Err(RetrievalError::shape_mismatch(
                "catalog names vs stored projections",
                &[space.len()],
                &[names.len()],
            ));
        }
        if space.mean_image.shape() != (config.height, config.width) {
            return Err(RetrievalError::shape_mismatch(
                "stored mean image vs configured resolution",
                &[config.height, config.width],
                &[space.mean_image.height(), space.mean_image.width()],
            ));
        }
        Ok(Self {
            names,
            space,
            config: config.clone(),
        })
    }

    /// Stored form of the fitted space
    pub fn to_record(&self) -> ImageSpaceRecord {
        ImageSpaceRecord::from(&self.space)
    }

    /// Rank catalog images against a query image
    ///
    /// # Returns
    ///
    /// At most `top_k` matches, closest first
    pub fn query(&self, image: &ImageMatrix, top_k: usize) -> Result<Vec<NamedImageMatch>, RetrievalError> {
        let image = to_resolution(image, &self.config)?;
        let projection = self.space.project(&image)?;
        let matches = rank_projections(&projection, &self.space.projections, top_k)?;
        Ok(matches
            .into_iter()
            .map(|result| NamedImageMatch {
                name: self.names[result.index].clone(),
                result,
            })
            .collect())
    }

    /// Entry names in stored order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The fitted image space
    pub fn space(&self) -> &ImageSpace {
        &self.space
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the catalog holds no images
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn to_resolution(image: &ImageMatrix, config: &ImageConfig) -> Result<ImageMatrix, RetrievalError> {
    if image.shape() == (config.height, config.width) {
        Ok(image.clone())
    } else {
        resize_nearest(image, config.height, config.width)
    }
}

/// Melody fingerprints addressable by name
#[derive(Debug, Clone)]
pub struct MelodyCatalog {
    names: Vec<String>,
    features: Vec<FeatureSet>,
    config: MelodyConfig,
}

impl MelodyCatalog {
    /// Empty catalog
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unusable configuration
    pub fn new(config: MelodyConfig) -> Result<Self, RetrievalError> {
        config.validate()?;
        Ok(Self {
            names: Vec::new(),
            features: Vec::new(),
            config,
        })
    }

    /// Build a catalog from named pitch sequences, extracting in parallel
    pub fn from_sequences(
        entries: Vec<(String, Vec<Option<u8>>)>,
        config: MelodyConfig,
    ) -> Result<Self, RetrievalError> {
        let (names, sequences): (Vec<String>, Vec<Vec<Option<u8>>>) = entries.into_iter().unzip();
        log::debug!("Building melody catalog from {} sequences", sequences.len());
        let features = extract_features_batch(&sequences, &config)?;
        Ok(Self {
            names,
            features,
            config,
        })
    }

    /// Restore a catalog from stored melody records
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a record's histogram lengths differ from
    /// the ones `config` produces
    pub fn from_records(records: &[MelodyRecord], config: MelodyConfig) -> Result<Self, RetrievalError> {
        let mut catalog = Self::new(config)?;
        for record in records {
            catalog.insert_features(record.name.clone(), record.to_feature_set()?)?;
        }
        Ok(catalog)
    }

    /// Stored form of every entry
    pub fn to_records(&self) -> Vec<MelodyRecord> {
        self.names
            .iter()
            .zip(&self.features)
            .map(|(name, fs)| MelodyRecord::new(name.clone(), fs))
            .collect()
    }

    /// Fingerprint a pitch sequence and add it
    pub fn insert(&mut self, name: impl Into<String>, sequence: &[Option<u8>]) -> Result<(), RetrievalError> {
        let features = extract_features(sequence, &self.config)?;
        self.insert_features(name, features)
    }

    /// Add an already extracted feature set
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the feature set is ragged or its histogram
    /// lengths differ from the ones the catalog configuration produces
    pub fn insert_features(&mut self, name: impl Into<String>, features: FeatureSet) -> Result<(), RetrievalError> {
        let name = name.into();
        features.check_lengths(
            self.config.histogram_lengths(),
            &format!("melody '{}' vs catalog histograms", name),
        )?;
        self.names.push(name);
        self.features.push(features);
        Ok(())
    }

    /// Rank catalog melodies against a query pitch sequence
    ///
    /// # Returns
    ///
    /// At most `top_k` matches, best first
    pub fn query(&self, sequence: &[Option<u8>], top_k: usize) -> Result<Vec<NamedMelodyMatch>, RetrievalError> {
        let query = extract_features(sequence, &self.config)?;
        self.query_features(&query, top_k)
    }

    /// Rank catalog melodies against an extracted feature set
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the query was extracted with histogram
    /// lengths other than the catalog's
    pub fn query_features(&self, query: &FeatureSet, top_k: usize) -> Result<Vec<NamedMelodyMatch>, RetrievalError> {
        query.check_lengths(self.config.histogram_lengths(), "query vs catalog histograms")?;
        let matches = rank_feature_sets(query, &self.features, top_k, &self.config)?
            .into_iter()
            .map(|result| NamedMelodyMatch {
                name: self.names[result.index].clone(),
                result,
            })
            .collect();
        Ok(matches)
    }

    /// Feature set stored under `name` (first match)
    pub fn get(&self, name: &str) -> Option<&FeatureSet> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.features[i])
    }

    /// Entry names in stored order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Configuration used for every entry
    pub fn config(&self) -> &MelodyConfig {
        &self.config
    }

    /// Number of melodies
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the catalog holds no melodies
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::histogram::ShrinkConfig;

    fn seq(pitches: &[u8]) -> Vec<Option<u8>> {
        pitches.iter().map(|&p| Some(p)).collect()
    }

    fn melody_config() -> MelodyConfig {
        MelodyConfig {
            window_size: 6,
            hop_size: 2,
            ..MelodyConfig::default()
        }
    }

    fn image_config() -> ImageConfig {
        ImageConfig {
            height: 4,
            width: 4,
            components: 2,
            max_iterations: 500,
            tolerance: 1e-10,
            seed: Some(5),
        }
    }

    fn gradient(scale: f64) -> ImageMatrix {
        ImageMatrix::new(4, 4, (0..16).map(|i| i as f64 * scale).collect()).unwrap()
    }

    #[test]
    fn test_melody_catalog_finds_transposed_copy() {
        let catalog = MelodyCatalog::from_sequences(
            vec![
                ("scale".to_string(), seq(&[60, 62, 64, 65, 67, 69, 71, 72])),
                ("leaps".to_string(), seq(&[60, 72, 55, 67, 48, 70, 50, 75])),
                ("drone".to_string(), seq(&[60; 8])),
            ],
            melody_config(),
        )
        .unwrap();

        let matches = catalog.query(&seq(&[65, 67, 69, 70, 72, 74, 76, 77]), 2).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "scale");
        assert!((matches[0].result.score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_melody_catalog_records() {
        let mut catalog = MelodyCatalog::new(melody_config()).unwrap();
        catalog.insert("a", &seq(&[60, 62, 64, 65, 67, 69])).unwrap();
        catalog.insert("short", &seq(&[60])).unwrap();

        let records = catalog.to_records();
        let restored = MelodyCatalog::from_records(&records, melody_config()).unwrap();
        assert_eq!(restored.names(), catalog.names());
        assert_eq!(restored.get("a"), catalog.get("a"));
        assert!(restored.get("short").map_or(false, FeatureSet::is_empty));
    }

    #[test]
    fn test_melody_catalog_rejects_foreign_shape() {
        let mut catalog = MelodyCatalog::new(melody_config()).unwrap();
        catalog.insert("a", &seq(&[60, 62, 64, 65, 67, 69])).unwrap();
        let foreign = FeatureSet {
            windows: vec![crate::features::melody::WindowHistograms {
                atb: vec![1.0; 3],
                rtb: vec![1.0; 3],
                ftb: vec![1.0; 3],
            }],
        };
        assert!(catalog.insert_features("b", foreign).is_err());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_image_catalog_query_self() {
        let entries = vec![
            ("flat".to_string(), ImageMatrix::zeros(4, 4)),
            ("soft".to_string(), gradient(1.0)),
            ("hard".to_string(), gradient(3.0)),
        ];
        let catalog = ImageCatalog::build(entries, &image_config()).unwrap();
        assert_eq!(catalog.len(), 3);

        let matches = catalog.query(&gradient(3.0), 3).unwrap();
        assert_eq!(matches[0].name, "hard");
        assert!(matches[0].result.distance < 1e-6);
        assert_eq!(matches[2].name, "flat");
    }

    #[test]
    fn test_image_catalog_resizes_inputs() {
        let big = ImageMatrix::new(8, 8, (0..64).map(|i| i as f64).collect()).unwrap();
        let entries = vec![
            ("zero".to_string(), ImageMatrix::zeros(4, 4)),
            ("big".to_string(), big.clone()),
        ];
        let catalog = ImageCatalog::build(entries, &image_config()).unwrap();
        assert_eq!(catalog.space().mean_image.shape(), (4, 4));
        let matches = catalog.query(&big, 1).unwrap();
        assert_eq!(matches[0].name, "big");
    }

    #[test]
    fn test_image_catalog_record_roundtrip() {
        let entries = vec![
            ("a".to_string(), gradient(1.0)),
            ("b".to_string(), gradient(2.0)),
        ];
        let catalog = ImageCatalog::build(entries, &image_config()).unwrap();
        let record = catalog.to_record();

        let restored =
            ImageCatalog::from_record(catalog.names().to_vec(), record.clone(), &image_config()).unwrap();
        assert_eq!(restored.space(), catalog.space());
        assert!(ImageCatalog::from_record(vec!["only".to_string()], record, &image_config()).is_err());
    }

    #[test]
    fn test_melody_records_under_other_config() {
        let shrunk = MelodyConfig {
            shrink: Some(ShrinkConfig::default()),
            ..melody_config()
        };
        let mut catalog = MelodyCatalog::new(shrunk.clone()).unwrap();
        catalog.insert("same", &seq(&[60, 62, 64, 65, 67, 69])).unwrap();
        let records = catalog.to_records();

        assert!(matches!(
            MelodyCatalog::from_records(&records, melody_config()),
            Err(RetrievalError::ShapeMismatch { .. })
        ));
        assert!(MelodyCatalog::from_records(&records, shrunk).is_ok());
    }

    #[test]
    fn test_query_features_rejects_other_lengths() {
        let catalog = MelodyCatalog::from_sequences(
            vec![("same".to_string(), seq(&[60, 62, 64, 65, 67, 69]))],
            melody_config(),
        )
        .unwrap();
        let shrunk = MelodyConfig {
            shrink: Some(ShrinkConfig::default()),
            ..melody_config()
        };
        let query = extract_features(&seq(&[60, 62, 64, 65, 67, 69]), &shrunk).unwrap();
        assert!(matches!(
            catalog.query_features(&query, 1),
            Err(RetrievalError::ShapeMismatch { .. })
        ));
    }
}
