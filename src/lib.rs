//! D&D Prediction Pipeline Library
//!
//! Real-time detention & demurrage risk scoring for cargo shipments:
//! feature assembly, artifact provisioning with deterministic fallback,
//! probability scoring, risk-tier classification, importance ranking, and
//! an append-only prediction audit log.

pub mod config;
pub mod features;
pub mod history;
pub mod importance;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod types;

pub use config::AppConfig;
pub use features::{FeatureAssembler, FeatureVector};
pub use history::HistoryRecorder;
pub use importance::ImportanceRanker;
pub use models::{ModelProvider, Scorer, ScoringArtifact};
pub use pipeline::RiskPipeline;
pub use types::{PredictionOutcome, PredictionReport, RiskLevel, ShipmentFeatures};
