//! Persisted scoring artifact: classifier, feature order, scaler, threshold
//! and training metadata in one versioned JSON document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::models::forest::RandomForest;
use crate::models::scaler::StandardScaler;

/// Artifact schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write artifact at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("artifact is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported artifact schema version {found}, expected {SCHEMA_VERSION}")]
    SchemaVersion { found: u32 },

    #[error("artifact feature list has {found} entries, expected {FEATURE_COUNT}")]
    FeatureCount { found: usize },

    #[error("artifact feature order mismatch at position {position}: expected {expected}, found {found}")]
    FeatureOrder {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("artifact scaler covers {found} features, expected {FEATURE_COUNT}")]
    ScalerArity { found: usize },

    #[error("artifact classifier expects {found} features, expected {FEATURE_COUNT}")]
    ClassifierArity { found: usize },

    #[error("artifact contains an empty forest")]
    EmptyForest,
}

/// Training provenance carried alongside the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    /// Evaluation metrics recorded at training time (accuracy, recall, ...)
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// Immutable bundle of everything needed to turn a feature vector into a
/// probability. Read-only once resident; prediction requests never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringArtifact {
    pub schema_version: u32,
    /// Canonical feature order the classifier was trained with
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    /// Decision threshold on the positive-class probability
    pub threshold: f64,
    pub metadata: ArtifactMetadata,
}

impl ScoringArtifact {
    /// Load and validate a persisted artifact.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_str(&raw)?;
        artifact.validate()?;

        info!(
            path = %path.display(),
            version = %artifact.metadata.model_version,
            trees = artifact.forest.n_trees(),
            "Scoring artifact loaded"
        );
        Ok(artifact)
    }

    /// Persist the artifact as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ArtifactError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Scoring artifact saved");
        Ok(())
    }

    /// Reject artifacts whose structure cannot score the canonical vector.
    ///
    /// A feature-order mismatch in particular must fail here: scoring through
    /// a reordered artifact would silently corrupt every prediction.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ArtifactError::SchemaVersion {
                found: self.schema_version,
            });
        }
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(ArtifactError::FeatureCount {
                found: self.feature_names.len(),
            });
        }
        for (position, (found, expected)) in
            self.feature_names.iter().zip(FEATURE_NAMES).enumerate()
        {
            if found.as_str() != expected {
                return Err(ArtifactError::FeatureOrder {
                    position,
                    expected: expected.to_string(),
                    found: found.clone(),
                });
            }
        }
        if self.scaler.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::ScalerArity {
                found: self.scaler.n_features(),
            });
        }
        if self.forest.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::ClassifierArity {
                found: self.forest.n_features(),
            });
        }
        if self.forest.n_trees() == 0 {
            return Err(ArtifactError::EmptyForest);
        }
        Ok(())
    }

    /// Declared accuracy from the training metrics, 0.0 when absent.
    pub fn accuracy(&self) -> f64 {
        self.metadata.metrics.get("accuracy").copied().unwrap_or(0.0)
    }
}
