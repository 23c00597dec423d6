//! Feature assembly for D&D risk scoring.
//!
//! Normalizes a partially-specified shipment payload into the complete,
//! ordered feature vector the scoring artifact was trained with.

use crate::types::shipment::{FeatureValue, ShipmentFeatures};

/// Number of features in the model input vector.
pub const FEATURE_COUNT: usize = 15;

/// Number of raw (caller-supplied) features; the rest are derived.
pub const RAW_FEATURE_COUNT: usize = 10;

/// Canonical feature order. The scoring artifact stores this same list and
/// it is validated at load time: scoring with a reordered vector corrupts
/// every prediction without any error signal.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    // Raw (10)
    "transit_time_days",
    "port_congestion_index",
    "carrier_reliability_score",
    "documentation_completeness",
    "customs_complexity_score",
    "container_value_usd",
    "days_until_eta",
    "historical_dd_rate",
    "route_risk_score",
    "seasonal_risk_factor",
    // Derived (5)
    "risk_composite_score",
    "historical_performance_ratio",
    "route_congestion_product",
    "time_pressure_index",
    "documentation_risk_factor",
];

/// Domain default for each feature, in canonical order. Substituted for
/// absent raw fields and used as the reference point for the
/// increases/decreases-risk impact tag.
pub const FEATURE_DEFAULTS: [f64; FEATURE_COUNT] = [
    14.0,    // transit_time_days
    0.5,     // port_congestion_index
    0.85,    // carrier_reliability_score
    0.9,     // documentation_completeness
    0.3,     // customs_complexity_score
    50000.0, // container_value_usd
    14.0,    // days_until_eta
    0.15,    // historical_dd_rate
    0.5,     // route_risk_score
    0.5,     // seasonal_risk_factor
    0.5,     // risk_composite_score
    0.85,    // historical_performance_ratio
    0.25,    // route_congestion_product
    0.3,     // time_pressure_index
    0.1,     // documentation_risk_factor
];

/// Complete model input in canonical feature order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Weighted composite of congestion, carrier reliability, customs complexity
/// and route risk.
pub fn risk_composite(congestion: f64, reliability: f64, customs: f64, route_risk: f64) -> f64 {
    0.3 * congestion + 0.2 * (1.0 - reliability) + 0.2 * customs + 0.3 * route_risk
}

/// Carrier reliability discounted by the lane's historical D&D rate.
pub fn historical_performance_ratio(reliability: f64, historical_dd_rate: f64) -> f64 {
    reliability * (1.0 - historical_dd_rate)
}

/// Port congestion amplified by route risk.
pub fn route_congestion_product(congestion: f64, route_risk: f64) -> f64 {
    congestion * route_risk
}

/// Schedule pressure in [0,1]. A zero-day transit is maximal pressure, not a
/// division by zero.
pub fn time_pressure_index(days_until_eta: f64, transit_time_days: f64) -> f64 {
    if transit_time_days == 0.0 {
        return 1.0;
    }
    (1.0 - days_until_eta / transit_time_days).clamp(0.0, 1.0)
}

/// Documentation gap scaled by customs complexity.
pub fn documentation_risk_factor(documentation_completeness: f64, customs: f64) -> f64 {
    (1.0 - documentation_completeness) * customs
}

/// Assembles a shipment payload into the ordered numeric vector.
///
/// Absent raw fields fall back to domain defaults, mistyped values are
/// coerced rather than rejected, and derived features are computed from the
/// resolved raws unless the caller supplied an explicit override. Overrides
/// are accepted verbatim, without consistency checks against the raw values.
pub struct FeatureAssembler;

impl FeatureAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Produce the complete feature vector for one shipment.
    pub fn assemble(&self, input: &ShipmentFeatures) -> FeatureVector {
        let transit_time_days = resolve(&input.transit_time_days, FEATURE_DEFAULTS[0]);
        let port_congestion_index = resolve(&input.port_congestion_index, FEATURE_DEFAULTS[1]);
        let carrier_reliability_score =
            resolve(&input.carrier_reliability_score, FEATURE_DEFAULTS[2]);
        let documentation_completeness =
            resolve(&input.documentation_completeness, FEATURE_DEFAULTS[3]);
        let customs_complexity_score =
            resolve(&input.customs_complexity_score, FEATURE_DEFAULTS[4]);
        let container_value_usd = resolve(&input.container_value_usd, FEATURE_DEFAULTS[5]);
        let days_until_eta = resolve(&input.days_until_eta, FEATURE_DEFAULTS[6]);
        let historical_dd_rate = resolve(&input.historical_dd_rate, FEATURE_DEFAULTS[7]);
        let route_risk_score = resolve(&input.route_risk_score, FEATURE_DEFAULTS[8]);
        let seasonal_risk_factor = resolve(&input.seasonal_risk_factor, FEATURE_DEFAULTS[9]);

        let risk_composite_score = override_or(&input.risk_composite_score, || {
            risk_composite(
                port_congestion_index,
                carrier_reliability_score,
                customs_complexity_score,
                route_risk_score,
            )
        });
        let performance_ratio = override_or(&input.historical_performance_ratio, || {
            historical_performance_ratio(carrier_reliability_score, historical_dd_rate)
        });
        let congestion_product = override_or(&input.route_congestion_product, || {
            route_congestion_product(port_congestion_index, route_risk_score)
        });
        let time_pressure = override_or(&input.time_pressure_index, || {
            time_pressure_index(days_until_eta, transit_time_days)
        });
        let documentation_risk = override_or(&input.documentation_risk_factor, || {
            documentation_risk_factor(documentation_completeness, customs_complexity_score)
        });

        FeatureVector([
            transit_time_days,
            port_congestion_index,
            carrier_reliability_score,
            documentation_completeness,
            customs_complexity_score,
            container_value_usd,
            days_until_eta,
            historical_dd_rate,
            route_risk_score,
            seasonal_risk_factor,
            risk_composite_score,
            performance_ratio,
            congestion_product,
            time_pressure,
            documentation_risk,
        ])
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(value: &Option<FeatureValue>, default: f64) -> f64 {
    value.as_ref().map(FeatureValue::as_f64).unwrap_or(default)
}

fn override_or(value: &Option<FeatureValue>, compute: impl FnOnce() -> f64) -> f64 {
    value.as_ref().map(FeatureValue::as_f64).unwrap_or_else(compute)
}
