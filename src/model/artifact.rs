//! Persisted model bundle
//!
//! The classifier is only meaningful together with the encoders and feature
//! order it was trained with, so all of them are stored as one value and
//! checked against each other whenever the bundle is built or loaded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

use crate::features::{CategoricalEncoder, EncoderRegistry, InferenceDefaults, FEATURE_NAMES};
use crate::model::forest::WinnerClassifier;
use crate::{CricketError, Result};

/// Bumped whenever the serialized layout changes
pub const FORMAT_VERSION: u32 = 2;

/// Immutable result of a training run
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedArtifact {
    format_version: u32,
    classifier: WinnerClassifier,
    registry: EncoderRegistry,
    feature_names: Vec<String>,
    defaults: InferenceDefaults,
    trained_rows: usize,
    /// SHA-256 over classifier, encoders, feature order and defaults
    checksum: String,
}

impl TrainedArtifact {
    pub(crate) fn new(
        classifier: WinnerClassifier,
        registry: EncoderRegistry,
        feature_names: Vec<String>,
        defaults: InferenceDefaults,
        trained_rows: usize,
    ) -> Result<Self> {
        let checksum = checksum(&classifier, &registry, &feature_names, &defaults)?;
        let artifact = TrainedArtifact {
            format_version: FORMAT_VERSION,
            classifier,
            registry,
            feature_names,
            defaults,
            trained_rows,
            checksum,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the bundle as JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        log::info!("Saved model to {}", path.display());
        Ok(())
    }

    /// Read and validate a bundle written by `save`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CricketError::NoModel);
        }
        let file = std::fs::File::open(path)?;
        let artifact: TrainedArtifact =
            serde_json::from_reader(std::io::BufReader::new(file))?;
        artifact.validate()?;
        log::debug!(
            "Loaded model from {} ({} training rows)",
            path.display(),
            artifact.trained_rows
        );
        Ok(artifact)
    }

    /// Check that every component agrees with the others
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(CricketError::ArtifactMismatch(format!(
                "format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }

        let expected = checksum(
            &self.classifier,
            &self.registry,
            &self.feature_names,
            &self.defaults,
        )?;
        if self.checksum != expected {
            return Err(CricketError::ArtifactMismatch(
                "checksum mismatch: classifier, encoders or defaults come from different training runs"
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.feature_names {
            if !FEATURE_NAMES.contains(&name.as_str()) {
                return Err(CricketError::ArtifactMismatch(format!(
                    "unknown feature '{}'",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(CricketError::ArtifactMismatch(format!(
                    "duplicate feature '{}'",
                    name
                )));
            }
        }

        if self.classifier.n_features() != self.feature_names.len() {
            return Err(CricketError::FeatureMismatch {
                expected: self.feature_names.len(),
                found: self.classifier.n_features(),
            });
        }

        let teams = self.registry.teams();
        if let Some(&code) = self
            .classifier
            .classes()
            .iter()
            .find(|&&c| c as usize >= teams.len())
        {
            return Err(CricketError::ArtifactMismatch(format!(
                "classifier emits code {} outside the {} known teams",
                code,
                teams.len()
            )));
        }

        if !self.registry.cities().contains(&self.defaults.city) {
            return Err(CricketError::ArtifactMismatch(format!(
                "default city '{}' is not in the city encoder",
                self.defaults.city
            )));
        }

        Ok(())
    }

    pub fn classifier(&self) -> &WinnerClassifier {
        &self.classifier
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    /// Encoder used to decode predicted codes (the shared team domain)
    pub fn winner_encoder(&self) -> &CategoricalEncoder {
        self.registry.teams()
    }

    /// Feature order the classifier expects
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn defaults(&self) -> &InferenceDefaults {
        &self.defaults
    }

    pub fn trained_rows(&self) -> usize {
        self.trained_rows
    }

    /// Hex SHA-256 of the bundle contents
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

fn checksum(
    classifier: &WinnerClassifier,
    registry: &EncoderRegistry,
    feature_names: &[String],
    defaults: &InferenceDefaults,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(classifier)?);
    hasher.update(serde_json::to_vec(registry)?);
    hasher.update(serde_json::to_vec(feature_names)?);
    hasher.update(serde_json::to_vec(defaults)?);
    Ok(format!("{:x}", hasher.finalize()))
}
