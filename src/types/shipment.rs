//! Shipment payloads accepted by the scoring pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A loosely-typed feature value as received over the wire.
///
/// Callers are not trusted to send clean numerics. Booleans coerce to
/// 1.0/0.0 and anything else collapses to 0.0 during assembly; no input
/// shape is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Bool(bool),
    Other(Value),
}

impl FeatureValue {
    /// Numeric value used in the feature vector.
    pub fn as_f64(&self) -> f64 {
        match self {
            FeatureValue::Number(n) => *n,
            FeatureValue::Bool(true) => 1.0,
            FeatureValue::Bool(false) => 0.0,
            FeatureValue::Other(_) => 0.0,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

/// Shipment attributes submitted for D&D risk scoring.
///
/// The ten raw fields may arrive partially filled; absent ones fall back to
/// domain defaults during assembly. The five trailing fields are optional
/// overrides for derived features the assembler otherwise computes.
/// Unrecognized keys in the payload are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentFeatures {
    /// Planned transit duration in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_time_days: Option<FeatureValue>,

    /// Destination port congestion index (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_congestion_index: Option<FeatureValue>,

    /// Carrier on-time reliability score (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_reliability_score: Option<FeatureValue>,

    /// Share of shipping documents already filed (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_completeness: Option<FeatureValue>,

    /// Customs clearance complexity for the destination (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customs_complexity_score: Option<FeatureValue>,

    /// Declared container value in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_value_usd: Option<FeatureValue>,

    /// Days remaining until estimated arrival
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_eta: Option<FeatureValue>,

    /// Historical D&D incidence rate on this lane (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_dd_rate: Option<FeatureValue>,

    /// Route risk score (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_risk_score: Option<FeatureValue>,

    /// Seasonal risk factor (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_risk_factor: Option<FeatureValue>,

    /// Override: weighted composite of congestion, reliability, customs and route risk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_composite_score: Option<FeatureValue>,

    /// Override: reliability discounted by the historical D&D rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_performance_ratio: Option<FeatureValue>,

    /// Override: congestion x route risk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_congestion_product: Option<FeatureValue>,

    /// Override: schedule pressure in [0,1], 1 = ETA already consumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_pressure_index: Option<FeatureValue>,

    /// Override: documentation gap scaled by customs complexity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_risk_factor: Option<FeatureValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_payload_deserialization() {
        let json = r#"{"transit_time_days": 18, "port_congestion_index": 0.75}"#;
        let features: ShipmentFeatures = serde_json::from_str(json).unwrap();

        assert_eq!(features.transit_time_days, Some(FeatureValue::Number(18.0)));
        assert_eq!(
            features.port_congestion_index,
            Some(FeatureValue::Number(0.75))
        );
        assert_eq!(features.carrier_reliability_score, None);
    }

    #[test]
    fn test_unrecognized_keys_ignored() {
        let json = r#"{"transit_time_days": 12, "shipment_id": "SH-001", "notes": ["x"]}"#;
        let features: ShipmentFeatures = serde_json::from_str(json).unwrap();

        assert_eq!(features.transit_time_days, Some(FeatureValue::Number(12.0)));
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(FeatureValue::Number(0.4).as_f64(), 0.4);
        assert_eq!(FeatureValue::Bool(true).as_f64(), 1.0);
        assert_eq!(FeatureValue::Bool(false).as_f64(), 0.0);
        assert_eq!(FeatureValue::Other(Value::String("n/a".into())).as_f64(), 0.0);
    }

    #[test]
    fn test_mistyped_values_still_deserialize() {
        let json = r#"{"documentation_completeness": true, "route_risk_score": "high"}"#;
        let features: ShipmentFeatures = serde_json::from_str(json).unwrap();

        assert_eq!(features.documentation_completeness.unwrap().as_f64(), 1.0);
        assert_eq!(features.route_risk_score.unwrap().as_f64(), 0.0);
    }
}
