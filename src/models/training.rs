//! Synthetic training data for fallback synthesis and the offline trainer.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use statrs::distribution::{Beta, Gamma, LogNormal, Normal};

use crate::features::{
    self, FEATURE_COUNT, RAW_FEATURE_COUNT,
};

/// Row-major samples with binary D&D labels.
pub struct SyntheticDataset {
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u32>,
}

/// Standard-normal feature matrix with a fixed share of positive labels.
///
/// Backs fallback artifact synthesis: not representative of real shipments,
/// but reproducible for a given RNG seed and carrying the target domain's
/// class imbalance.
pub fn standard_normal_dataset(
    n_samples: usize,
    positive_rate: f64,
    rng: &mut StdRng,
) -> SyntheticDataset {
    let normal = Normal::new(0.0, 1.0).expect("unit normal parameters");

    let rows: Vec<Vec<f64>> = (0..n_samples)
        .map(|_| (0..FEATURE_COUNT).map(|_| normal.sample(rng)).collect())
        .collect();

    let mut labels = vec![0u32; n_samples];
    let mut order: Vec<usize> = (0..n_samples).collect();
    order.shuffle(rng);
    let n_positive = (n_samples as f64 * positive_rate) as usize;
    for &i in order.iter().take(n_positive) {
        labels[i] = 1;
    }

    SyntheticDataset { rows, labels }
}

/// Shipment-shaped synthetic dataset with rule-derived labels.
///
/// Raw features follow plausible lane distributions (gamma transit times,
/// beta-shaped indices, log-normal container values); derived features come
/// from the same formulas the assembler uses; labels follow a weighted risk
/// rule targeting roughly a 6% positive rate, with a deterministic override
/// for clearly compromised shipments.
pub fn shipment_dataset(n_samples: usize, rng: &mut StdRng) -> SyntheticDataset {
    let transit_dist = Gamma::new(3.0, 0.5).expect("gamma parameters");
    let congestion_dist = Beta::new(2.0, 5.0).expect("beta parameters");
    let reliability_dist = Beta::new(5.0, 2.0).expect("beta parameters");
    let documentation_dist = Beta::new(8.0, 2.0).expect("beta parameters");
    let customs_dist = Beta::new(3.0, 3.0).expect("beta parameters");
    let value_dist = LogNormal::new(10.0, 1.5).expect("log-normal parameters");
    let eta_dist = Gamma::new(2.0, 1.0 / 3.0).expect("gamma parameters");
    let dd_rate_dist = Beta::new(2.0, 8.0).expect("beta parameters");
    let route_dist = Beta::new(3.0, 4.0).expect("beta parameters");
    let noise_dist = Normal::new(0.0, 0.05).expect("normal parameters");

    let mut rows = Vec::with_capacity(n_samples);
    let mut risk_scores = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let transit_time_days = transit_dist.sample(rng) * 5.0;
        let port_congestion_index = congestion_dist.sample(rng);
        let carrier_reliability_score = reliability_dist.sample(rng);
        let documentation_completeness = documentation_dist.sample(rng);
        let customs_complexity_score = customs_dist.sample(rng);
        let container_value_usd = value_dist.sample(rng);
        let days_until_eta = eta_dist.sample(rng);
        let historical_dd_rate = dd_rate_dist.sample(rng);
        let route_risk_score = route_dist.sample(rng);
        let seasonal_risk_factor =
            rng.gen_range(0.0..std::f64::consts::TAU).sin().abs() * 0.5 + 0.5;

        let risk_composite_score = features::risk_composite(
            port_congestion_index,
            carrier_reliability_score,
            customs_complexity_score,
            route_risk_score,
        );
        let historical_performance_ratio =
            features::historical_performance_ratio(carrier_reliability_score, historical_dd_rate);
        let route_congestion_product =
            features::route_congestion_product(port_congestion_index, route_risk_score);
        let time_pressure_index =
            features::time_pressure_index(days_until_eta, transit_time_days);
        let documentation_risk_factor = features::documentation_risk_factor(
            documentation_completeness,
            customs_complexity_score,
        );

        let risk_score = risk_composite_score * 0.25
            + time_pressure_index * 0.20
            + documentation_risk_factor * 0.15
            + route_congestion_product * 0.15
            + (1.0 - historical_performance_ratio) * 0.15
            + seasonal_risk_factor * 0.10
            + noise_dist.sample(rng);
        risk_scores.push(risk_score);

        rows.push(vec![
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
            historical_performance_ratio,
            route_congestion_product,
            time_pressure_index,
            documentation_risk_factor,
        ]);
    }

    // Label the top ~6% riskiest shipments positive.
    let cutoff = percentile(&risk_scores, 0.94);
    let mut labels: Vec<u32> = risk_scores
        .iter()
        .map(|&score| u32::from(score > cutoff))
        .collect();

    // Shipments that are congested, under-documented, and out of schedule
    // slack incur D&D regardless of the scored rule.
    for (row, label) in rows.iter().zip(labels.iter_mut()) {
        if row[1] > 0.8 && row[3] < 0.7 && row[RAW_FEATURE_COUNT + 3] > 0.7 {
            *label = 1;
        }
    }

    SyntheticDataset { rows, labels }
}

fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[rank]
}
