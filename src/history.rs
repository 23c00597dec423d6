//! Append-only prediction audit log, partitioned by calendar date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

use crate::types::prediction::PredictionReport;
use crate::types::shipment::ShipmentFeatures;

/// One immutable audit record: the request as received plus the full result.
#[derive(Debug, Serialize)]
struct HistoryEntry<'a> {
    timestamp: DateTime<Utc>,
    input: &'a ShipmentFeatures,
    result: &'a PredictionReport,
}

/// Best-effort provenance log for every prediction.
///
/// Records are appended as newline-delimited JSON, one file per calendar
/// date. Nothing here is ever updated or deleted, and a write failure never
/// affects the prediction response.
pub struct HistoryRecorder {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Append one prediction to today's partition.
    pub fn record(&self, input: &ShipmentFeatures, result: &PredictionReport) {
        if let Err(error) = self.try_record(input, result) {
            warn!(
                dir = %self.dir.display(),
                error = %error,
                "Failed to append prediction history"
            );
        }
    }

    /// Partition file for a given date.
    pub fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("predictions_{}.jsonl", date.format("%Y-%m-%d")))
    }

    fn try_record(
        &self,
        input: &ShipmentFeatures,
        result: &PredictionReport,
    ) -> anyhow::Result<()> {
        let entry = HistoryEntry {
            timestamp: result.timestamp,
            input,
            result,
        };
        let line = serde_json::to_string(&entry)?;
        let path = self.partition_path(Utc::now().date_naive());

        // One writer at a time so concurrent appends never interleave lines.
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("history write lock poisoned"))?;
        std::fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::{ModelInfo, RiskLevel};
    use tempfile::TempDir;

    fn sample_report() -> PredictionReport {
        PredictionReport {
            timestamp: Utc::now(),
            prediction: 0,
            risk_probability: 0.12,
            risk_percentage: 12.0,
            risk_level: RiskLevel::VeryLow,
            will_have_dd: false,
            prevention_confidence: 88.0,
            recommendation: RiskLevel::VeryLow.recommendation().to_string(),
            top_risk_factors: Vec::new(),
            model_info: ModelInfo {
                version: "2.0".to_string(),
                accuracy: 94.2,
                last_updated: Utc::now(),
            },
        }
    }

    #[test]
    fn test_appends_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let recorder = HistoryRecorder::new(dir.path());

        let input = ShipmentFeatures::default();
        let report = sample_report();
        recorder.record(&input, &report);
        recorder.record(&input, &report);

        let path = recorder.partition_path(Utc::now().date_naive());
        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["timestamp"].is_string());
            assert!(value["input"].is_object());
            assert_eq!(value["result"]["risk_level"], "VERY_LOW");
        }
    }

    #[test]
    fn test_creates_partition_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("audit").join("history");
        let recorder = HistoryRecorder::new(&nested);

        recorder.record(&ShipmentFeatures::default(), &sample_report());
        assert!(recorder
            .partition_path(Utc::now().date_naive())
            .exists());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        // A directory path that cannot be created (parent is a file).
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "not a directory").unwrap();

        let recorder = HistoryRecorder::new(blocker.join("history"));
        // Must not panic or error out.
        recorder.record(&ShipmentFeatures::default(), &sample_report());
    }
}
