//! Prediction result data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a risk probability into a tier.
    ///
    /// Bands are half-open on the lower bound; a probability sitting exactly
    /// on a boundary belongs to the higher tier.
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.2 {
            RiskLevel::VeryLow
        } else if probability < 0.4 {
            RiskLevel::Low
        } else if probability < 0.6 {
            RiskLevel::Moderate
        } else if probability < 0.8 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    /// Operational recommendation for this tier.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Low risk - standard processing",
            RiskLevel::Low => "Monitor shipment progress",
            RiskLevel::Moderate => "Proactive follow-up needed",
            RiskLevel::High => "Expedite clearance & prep contingencies",
            RiskLevel::Critical => "URGENT: Immediate intervention required",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "VERY_LOW",
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

/// Direction of a feature's contribution relative to its domain default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    IncreasesRisk,
    DecreasesRisk,
}

/// One ranked feature contribution to the current prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Canonical feature name
    pub feature: String,

    /// Resolved feature value, rounded to 3 decimals
    pub value: f64,

    /// Importance as a percentage, rounded to 2 decimals
    pub importance: f64,

    /// Whether the value sits above or below the feature's domain default
    pub impact: Impact,
}

/// Metadata about the artifact that produced a prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub version: String,
    pub accuracy: f64,
    pub last_updated: DateTime<Utc>,
}

/// Complete risk assessment for one shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// When the prediction was made
    pub timestamp: DateTime<Utc>,

    /// Binary outcome: 1 = D&D expected
    pub prediction: u8,

    /// Calibrated positive-class probability (0-1)
    pub risk_probability: f64,

    /// Probability expressed as a percentage, rounded to 2 decimals
    pub risk_percentage: f64,

    /// Discrete risk tier
    pub risk_level: RiskLevel,

    /// Convenience flag mirroring `prediction`
    pub will_have_dd: bool,

    /// Confidence that D&D will be avoided, as a percentage
    pub prevention_confidence: f64,

    /// Recommended operational response
    pub recommendation: String,

    /// Up to five features ranked descending by importance
    pub top_risk_factors: Vec<RiskFactor>,

    /// Artifact provenance
    pub model_info: ModelInfo,
}

/// Structured payload returned when scoring fails internally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub error: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl PredictionFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            timestamp: Utc::now(),
            status: "failed".to_string(),
        }
    }
}

/// What a prediction call hands back: a report, or a structured failure.
/// The request path never surfaces an unhandled fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Report(PredictionReport),
    Failure(PredictionFailure),
}

impl PredictionOutcome {
    pub fn report(&self) -> Option<&PredictionReport> {
        match self {
            PredictionOutcome::Report(report) => Some(report),
            PredictionOutcome::Failure(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PredictionOutcome::Failure(_))
    }
}

/// Health-check payload for the serving layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub model_loaded: bool,
    /// "loaded" for a trained artifact, "fallback" for a synthesized one
    pub model_source: String,
    pub model_accuracy: f64,
    pub prevention_rate: f64,
}

/// Summary of the resident classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStats {
    pub model: String,
    pub features: Vec<String>,
    pub accuracy: f64,
}
