//! Mean/variance input normalization matching the training-time scaler.

use serde::{Deserialize, Serialize};

/// Per-feature z-score standardization parameters.
///
/// Serialized alongside the classifier so a persisted artifact fully
/// describes its own input preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl StandardScaler {
    /// Fit scaling parameters on a row-major sample matrix.
    ///
    /// Uses the population standard deviation; a zero-variance feature keeps
    /// a unit scale so transforming it only centers the value.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let n = rows.len() as f64;

        let mut mean = vec![0.0; n_features];
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row) {
                *acc += value;
            }
        }
        for acc in &mut mean {
            *acc /= n;
        }

        let mut variance = vec![0.0; n_features];
        for row in rows {
            for (i, value) in row.iter().enumerate() {
                let delta = value - mean[i];
                variance[i] += delta * delta;
            }
        }
        let std = variance
            .into_iter()
            .map(|v| {
                let s = (v / n).sqrt();
                if s > 0.0 {
                    s
                } else {
                    1.0
                }
            })
            .collect();

        Self { mean, std }
    }

    /// Number of features the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one feature vector.
    pub fn transform(&self, input: &[f64]) -> Vec<f64> {
        input
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }
}
