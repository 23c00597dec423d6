//! Feature-importance ranking for individual predictions.

use crate::features::{FeatureVector, FEATURE_DEFAULTS, FEATURE_NAMES};
use crate::types::prediction::{Impact, RiskFactor};

/// Noise floor below which feature importances are not reported.
const IMPORTANCE_FLOOR: f64 = 0.01;

/// Maximum number of factors returned per prediction.
const MAX_FACTORS: usize = 5;

/// Ranks features by their trained importance weight, tagging each with
/// whether its resolved value sits above or below the domain default.
pub struct ImportanceRanker;

impl ImportanceRanker {
    pub fn new() -> Self {
        Self
    }

    /// Top contributing features for one prediction, descending by
    /// importance. A classifier without importance weights yields an empty
    /// ranking.
    pub fn rank(&self, vector: &FeatureVector, importances: Option<&[f64]>) -> Vec<RiskFactor> {
        let Some(importances) = importances else {
            return Vec::new();
        };

        let mut factors: Vec<RiskFactor> = Vec::new();
        for (index, (value, importance)) in
            vector.as_slice().iter().zip(importances).enumerate()
        {
            if *importance <= IMPORTANCE_FLOOR {
                continue;
            }
            let impact = if *value > FEATURE_DEFAULTS[index] {
                Impact::IncreasesRisk
            } else {
                Impact::DecreasesRisk
            };
            factors.push(RiskFactor {
                feature: FEATURE_NAMES[index].to_string(),
                value: round_dp(*value, 3),
                importance: round_dp(importance * 100.0, 2),
                impact,
            });
        }

        factors.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        factors.truncate(MAX_FACTORS);
        factors
    }
}

impl Default for ImportanceRanker {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureAssembler, FEATURE_COUNT};
    use crate::types::ShipmentFeatures;

    fn sample_vector() -> FeatureVector {
        FeatureAssembler::new().assemble(&ShipmentFeatures::default())
    }

    #[test]
    fn test_no_importances_yields_empty_ranking() {
        let ranker = ImportanceRanker::new();
        assert!(ranker.rank(&sample_vector(), None).is_empty());
    }

    #[test]
    fn test_rank_caps_sorts_and_filters() {
        let ranker = ImportanceRanker::new();
        // Descending weights; the last seven sit below the noise floor.
        let mut importances = vec![0.0; FEATURE_COUNT];
        for (i, weight) in importances.iter_mut().enumerate() {
            *weight = match i {
                0..=7 => 0.3 - 0.03 * i as f64,
                _ => 0.005,
            };
        }

        let factors = ranker.rank(&sample_vector(), Some(&importances));
        assert_eq!(factors.len(), MAX_FACTORS);
        assert_eq!(factors[0].feature, FEATURE_NAMES[0]);
        for pair in factors.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }
        assert!(factors.iter().all(|f| f.importance > IMPORTANCE_FLOOR * 100.0));
    }

    #[test]
    fn test_impact_tags_follow_defaults() {
        let ranker = ImportanceRanker::new();
        let shipment = ShipmentFeatures {
            transit_time_days: Some(30.0.into()), // above the 14.0 default
            port_congestion_index: Some(0.1.into()), // below the 0.5 default
            ..Default::default()
        };
        let vector = FeatureAssembler::new().assemble(&shipment);

        let mut importances = vec![0.0; FEATURE_COUNT];
        importances[0] = 0.5;
        importances[1] = 0.4;

        let factors = ranker.rank(&vector, Some(&importances));
        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0].feature, "transit_time_days");
        assert_eq!(factors[0].impact, Impact::IncreasesRisk);
        assert_eq!(factors[1].feature, "port_congestion_index");
        assert_eq!(factors[1].impact, Impact::DecreasesRisk);
    }

    #[test]
    fn test_values_and_percentages_rounded() {
        let ranker = ImportanceRanker::new();
        let shipment = ShipmentFeatures {
            transit_time_days: Some(17.123456.into()),
            ..Default::default()
        };
        let vector = FeatureAssembler::new().assemble(&shipment);

        let mut importances = vec![0.0; FEATURE_COUNT];
        importances[0] = 0.123456;

        let factors = ranker.rank(&vector, Some(&importances));
        assert_eq!(factors[0].value, 17.123);
        assert_eq!(factors[0].importance, 12.35);
    }
}
