//! End-to-end prediction pipeline: assemble, score, classify, rank, record.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::features::{FeatureAssembler, FEATURE_NAMES};
use crate::history::HistoryRecorder;
use crate::importance::{round_dp, ImportanceRanker};
use crate::metrics::PipelineMetrics;
use crate::models::provider::{ArtifactSource, ModelProvider};
use crate::models::scorer::Scorer;
use crate::types::prediction::{
    HealthReport, ModelInfo, ModelStats, PredictionFailure, PredictionOutcome, PredictionReport,
    RiskLevel,
};
use crate::types::shipment::ShipmentFeatures;

/// Stateless request/response scoring unit.
///
/// The provider's artifact is read-only after its one-time initialization,
/// so any number of concurrent `predict` calls may share one pipeline.
pub struct RiskPipeline {
    assembler: FeatureAssembler,
    provider: ModelProvider,
    ranker: ImportanceRanker,
    history: HistoryRecorder,
    metrics: Arc<PipelineMetrics>,
}

impl RiskPipeline {
    /// Build a pipeline with a provider constructed from configuration.
    pub fn new(config: &AppConfig) -> Self {
        let provider = ModelProvider::new(config.model.clone(), config.fallback.clone());
        Self::with_provider(provider, config)
    }

    /// Build a pipeline around an explicitly constructed provider.
    pub fn with_provider(provider: ModelProvider, config: &AppConfig) -> Self {
        Self {
            assembler: FeatureAssembler::new(),
            provider,
            ranker: ImportanceRanker::new(),
            history: HistoryRecorder::new(config.history.dir.clone()),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    /// Score one shipment.
    ///
    /// Always returns a well-formed outcome: internal failures degrade to a
    /// structured failure payload, never an unhandled fault.
    pub fn predict(&self, input: &ShipmentFeatures) -> PredictionOutcome {
        let start = Instant::now();

        match self.run(input) {
            Ok(report) => {
                info!(
                    risk_percentage = report.risk_percentage,
                    risk_level = report.risk_level.as_str(),
                    "Prediction complete"
                );
                self.metrics.record_prediction(
                    start.elapsed(),
                    report.risk_probability,
                    report.risk_level.as_str(),
                );
                self.history.record(input, &report);
                PredictionOutcome::Report(report)
            }
            Err(error) => {
                error!(error = %error, "Prediction failed");
                self.metrics.record_failure();
                PredictionOutcome::Failure(PredictionFailure::new(error.to_string()))
            }
        }
    }

    /// Score a batch of shipments, one outcome per input.
    pub fn predict_batch(&self, inputs: &[ShipmentFeatures]) -> Vec<PredictionOutcome> {
        inputs.iter().map(|input| self.predict(input)).collect()
    }

    fn run(&self, input: &ShipmentFeatures) -> anyhow::Result<PredictionReport> {
        let vector = self.assembler.assemble(input);
        let artifact = self.provider.artifact();

        let score = Scorer::new(artifact.clone()).score(&vector)?;
        let risk_level = RiskLevel::from_probability(score.probability);
        let top_risk_factors = self
            .ranker
            .rank(&vector, artifact.forest.feature_importances());

        Ok(PredictionReport {
            timestamp: Utc::now(),
            prediction: score.label,
            risk_probability: score.probability,
            risk_percentage: round_dp(score.probability * 100.0, 2),
            risk_level,
            will_have_dd: score.label == 1,
            prevention_confidence: round_dp((1.0 - score.probability) * 100.0, 2),
            recommendation: risk_level.recommendation().to_string(),
            top_risk_factors,
            model_info: ModelInfo {
                version: artifact.metadata.model_version.clone(),
                accuracy: artifact.accuracy(),
                last_updated: Utc::now(),
            },
        })
    }

    /// Health-check payload: artifact residency plus headline model figures.
    pub fn health(&self) -> HealthReport {
        let artifact = self.provider.artifact();
        HealthReport {
            status: "healthy".to_string(),
            model_loaded: self.provider.is_initialized(),
            model_source: self.provider.source().as_str().to_string(),
            model_accuracy: artifact.accuracy() / 100.0,
            prevention_rate: self.provider.prevention_rate(),
        }
    }

    /// Summary of the resident classifier.
    pub fn model_stats(&self) -> ModelStats {
        let artifact = self.provider.artifact();
        ModelStats {
            model: "RandomForest".to_string(),
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            accuracy: artifact.accuracy(),
        }
    }

    /// Whether the resident artifact was loaded or synthesized.
    pub fn artifact_source(&self) -> ArtifactSource {
        self.provider.source()
    }
}
