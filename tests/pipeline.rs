//! End-to-end tests for the prediction pipeline.

use chrono::Utc;
use dd_prediction_pipeline::config::AppConfig;
use dd_prediction_pipeline::history::HistoryRecorder;
use dd_prediction_pipeline::models::forest::ForestParams;
use dd_prediction_pipeline::models::provider::{ArtifactSource, ModelProvider};
use dd_prediction_pipeline::pipeline::RiskPipeline;
use dd_prediction_pipeline::types::{RiskLevel, ShipmentFeatures};
use std::sync::Arc;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.model.artifact_path = dir.path().join("dd_model.json");
    config.history.dir = dir.path().join("prediction_history");
    // Small fallback forest keeps synthesis fast; determinism is what the
    // tests care about.
    config.fallback.n_samples = 200;
    config.fallback.forest = ForestParams {
        n_estimators: 8,
        max_depth: 5,
        min_samples_split: 4,
        min_samples_leaf: 2,
    };
    config
}

fn documented_scenario() -> ShipmentFeatures {
    ShipmentFeatures {
        transit_time_days: Some(18.0.into()),
        port_congestion_index: Some(0.75.into()),
        carrier_reliability_score: Some(0.82.into()),
        documentation_completeness: Some(0.95.into()),
        customs_complexity_score: Some(0.4.into()),
        container_value_usd: Some(75000.0.into()),
        days_until_eta: Some(10.0.into()),
        historical_dd_rate: Some(0.12.into()),
        route_risk_score: Some(0.65.into()),
        seasonal_risk_factor: Some(0.7.into()),
        ..Default::default()
    }
}

#[test]
fn end_to_end_scenario_yields_well_formed_report() {
    let dir = TempDir::new().unwrap();
    let pipeline = RiskPipeline::new(&test_config(&dir));

    let outcome = pipeline.predict(&documented_scenario());
    let report = outcome.report().expect("prediction should succeed");

    assert!((0.0..=1.0).contains(&report.risk_probability));
    assert!(matches!(
        report.risk_level,
        RiskLevel::VeryLow
            | RiskLevel::Low
            | RiskLevel::Moderate
            | RiskLevel::High
            | RiskLevel::Critical
    ));
    assert!(report.top_risk_factors.len() <= 5);
    for pair in report.top_risk_factors.windows(2) {
        assert!(pair[0].importance >= pair[1].importance);
    }
    assert!(!report.recommendation.is_empty());
}

#[test]
fn empty_request_scores_on_defaults() {
    let dir = TempDir::new().unwrap();
    let pipeline = RiskPipeline::new(&test_config(&dir));

    let outcome = pipeline.predict(&ShipmentFeatures::default());
    let report = outcome.report().expect("empty request must not fail");
    assert!((0.0..=1.0).contains(&report.risk_probability));
}

#[test]
fn fallback_synthesis_is_reproducible() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();

    let pipeline_a = RiskPipeline::new(&test_config(&dir_a));
    let pipeline_b = RiskPipeline::new(&test_config(&dir_b));

    let input = documented_scenario();
    let report_a = pipeline_a.predict(&input);
    let report_b = pipeline_b.predict(&input);

    assert_eq!(
        report_a.report().unwrap().risk_probability,
        report_b.report().unwrap().risk_probability
    );
}

#[test]
fn explicit_derived_overrides_match_computed_path() {
    let dir = TempDir::new().unwrap();
    let pipeline = RiskPipeline::new(&test_config(&dir));

    let implicit = pipeline.predict(&documented_scenario());
    let implicit = implicit.report().unwrap();

    // Supply the derived features exactly as the assembler would compute them.
    let mut explicit_input = documented_scenario();
    explicit_input.risk_composite_score =
        Some((0.3 * 0.75 + 0.2 * (1.0 - 0.82) + 0.2 * 0.4 + 0.3 * 0.65).into());
    explicit_input.historical_performance_ratio = Some((0.82 * (1.0 - 0.12)).into());
    explicit_input.route_congestion_product = Some((0.75 * 0.65).into());
    explicit_input.time_pressure_index = Some((1.0 - 10.0 / 18.0).into());
    explicit_input.documentation_risk_factor = Some(((1.0 - 0.95) * 0.4).into());

    let explicit = pipeline.predict(&explicit_input);
    let explicit = explicit.report().unwrap();

    assert_eq!(implicit.risk_probability, explicit.risk_probability);
    assert_eq!(implicit.risk_level, explicit.risk_level);
}

#[test]
fn saved_fallback_artifact_reloads_with_identical_predictions() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    // First pipeline synthesizes a fallback; persist its artifact.
    let provider = ModelProvider::new(config.model.clone(), config.fallback.clone());
    assert_eq!(provider.source(), ArtifactSource::Fallback);
    provider
        .artifact()
        .save(&config.model.artifact_path)
        .unwrap();
    let first = RiskPipeline::with_provider(provider, &config);
    let before = first.predict(&documented_scenario());

    // Second pipeline finds the saved artifact and loads it.
    let second = RiskPipeline::new(&config);
    assert_eq!(second.artifact_source(), ArtifactSource::Loaded);
    let after = second.predict(&documented_scenario());

    assert_eq!(
        before.report().unwrap().risk_probability,
        after.report().unwrap().risk_probability
    );
}

#[test]
fn tampered_artifact_feature_order_falls_back() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let provider = ModelProvider::new(config.model.clone(), config.fallback.clone());
    provider
        .artifact()
        .save(&config.model.artifact_path)
        .unwrap();

    // Swap two feature names in the persisted document.
    let raw = std::fs::read_to_string(&config.model.artifact_path).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let names = value["feature_names"].as_array_mut().unwrap();
    names.swap(0, 1);
    std::fs::write(
        &config.model.artifact_path,
        serde_json::to_string(&value).unwrap(),
    )
    .unwrap();

    // The reordered artifact must be rejected, not silently used.
    let pipeline = RiskPipeline::new(&config);
    pipeline.predict(&documented_scenario());
    assert_eq!(pipeline.artifact_source(), ArtifactSource::Fallback);
}

#[test]
fn history_records_parse_back() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let pipeline = RiskPipeline::new(&config);

    pipeline.predict(&documented_scenario());
    pipeline.predict(&ShipmentFeatures::default());

    let recorder = HistoryRecorder::new(config.history.dir.clone());
    let path = recorder.partition_path(Utc::now().date_naive());
    let content = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["input"]["transit_time_days"], 18.0);
    assert!(first["result"]["risk_probability"].is_number());
    assert_eq!(
        first["result"]["status"],
        serde_json::Value::Null,
        "history stores reports, not failures"
    );
}

#[test]
fn concurrent_requests_share_one_artifact_and_agree() {
    let dir = TempDir::new().unwrap();
    let pipeline = Arc::new(RiskPipeline::new(&test_config(&dir)));

    let baseline = pipeline
        .predict(&documented_scenario())
        .report()
        .unwrap()
        .risk_probability;

    let probabilities: Vec<f64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pipeline = pipeline.clone();
                scope.spawn(move || {
                    let mut last = 0.0;
                    for _ in 0..5 {
                        let outcome = pipeline.predict(&documented_scenario());
                        last = outcome.report().expect("report").risk_probability;
                    }
                    last
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for probability in probabilities {
        assert_eq!(probability, baseline);
    }
}
