//! Probability scoring against the resident artifact.

use std::sync::Arc;
use thiserror::Error;

use crate::features::FeatureVector;
use crate::models::artifact::ScoringArtifact;

/// Outcome of scoring one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Positive-class probability in [0,1]
    pub probability: f64,
    /// Binary label implied by the artifact's decision threshold
    pub label: u8,
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("classifier produced no probability columns")]
    NoProbabilities,

    #[error("classifier produced a non-finite probability")]
    NonFinite,
}

/// Applies the artifact's scaler and classifier to feature vectors.
///
/// Purely read-only over the artifact; any number of scorers may share one
/// artifact across threads.
pub struct Scorer {
    artifact: Arc<ScoringArtifact>,
}

impl Scorer {
    pub fn new(artifact: Arc<ScoringArtifact>) -> Self {
        Self { artifact }
    }

    /// Score one vector: calibrated probability plus the thresholded label.
    ///
    /// Uses the positive-class probability column; a degenerate classifier
    /// with no positive class falls back to its single available column.
    pub fn score(&self, vector: &FeatureVector) -> Result<Score, ScoreError> {
        let scaled = self.artifact.scaler.transform(vector.as_slice());
        let probabilities = self.artifact.forest.predict_proba(&scaled);

        let positive_column = self
            .artifact
            .forest
            .classes()
            .iter()
            .position(|&class| class == 1);
        let probability = match positive_column {
            Some(column) if column < probabilities.len() => probabilities[column],
            _ => *probabilities.first().ok_or(ScoreError::NoProbabilities)?,
        };

        if !probability.is_finite() {
            return Err(ScoreError::NonFinite);
        }
        let probability = probability.clamp(0.0, 1.0);

        Ok(Score {
            probability,
            label: u8::from(probability >= self.artifact.threshold),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::features::{FeatureAssembler, FEATURE_COUNT};
    use crate::models::forest::{ForestParams, RandomForest};
    use crate::models::provider::ModelProvider;
    use crate::types::ShipmentFeatures;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn fallback_artifact() -> Arc<ScoringArtifact> {
        let dir = TempDir::new().unwrap();
        let defaults = AppConfig::default();
        let model = crate::config::ModelConfig {
            artifact_path: dir.path().join("missing.json"),
            ..defaults.model
        };
        let fallback = crate::config::FallbackConfig {
            n_samples: 150,
            forest: ForestParams {
                n_estimators: 6,
                max_depth: 4,
                min_samples_split: 4,
                min_samples_leaf: 2,
            },
            ..defaults.fallback
        };
        ModelProvider::new(model, fallback).artifact()
    }

    #[test]
    fn test_score_in_unit_interval() {
        let scorer = Scorer::new(fallback_artifact());
        let vector = FeatureAssembler::new().assemble(&ShipmentFeatures::default());

        let score = scorer.score(&vector).unwrap();
        assert!((0.0..=1.0).contains(&score.probability));
        assert!(score.label == 0 || score.label == 1);
    }

    #[test]
    fn test_score_is_deterministic() {
        let scorer = Scorer::new(fallback_artifact());
        let vector = FeatureAssembler::new().assemble(&ShipmentFeatures::default());

        assert_eq!(scorer.score(&vector).unwrap(), scorer.score(&vector).unwrap());
    }

    #[test]
    fn test_degenerate_single_class_uses_only_column() {
        let artifact = fallback_artifact();
        // Refit on single-class labels to force a one-column classifier.
        let mut rng = StdRng::seed_from_u64(9);
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|i| (0..FEATURE_COUNT).map(|j| (i * j) as f64 * 0.01).collect())
            .collect();
        let labels = vec![0u32; 60];
        let degenerate = RandomForest::fit(
            &rows,
            &labels,
            &ForestParams {
                n_estimators: 3,
                max_depth: 3,
                min_samples_split: 4,
                min_samples_leaf: 2,
            },
            &mut rng,
        );

        let artifact = ScoringArtifact {
            forest: degenerate,
            ..(*artifact).clone()
        };
        let scorer = Scorer::new(Arc::new(artifact));
        let vector = FeatureAssembler::new().assemble(&ShipmentFeatures::default());

        let score = scorer.score(&vector).unwrap();
        assert_eq!(score.probability, 1.0);
        assert_eq!(score.label, 1);
    }
}
