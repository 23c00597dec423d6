//! Type definitions for the prediction pipeline

pub mod prediction;
pub mod shipment;

pub use prediction::{PredictionFailure, PredictionOutcome, PredictionReport, RiskLevel};
pub use shipment::{FeatureValue, ShipmentFeatures};
