//! D&D Prediction Pipeline - Main Entry Point
//!
//! Reads one shipment payload per line from stdin, scores it, and writes one
//! JSON response per line to stdout. The surrounding serving layer (HTTP,
//! queues) stays outside this process boundary.

use anyhow::Result;
use dd_prediction_pipeline::{
    config::AppConfig,
    pipeline::RiskPipeline,
    types::{PredictionFailure, PredictionOutcome, ShipmentFeatures},
};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dd_prediction_pipeline=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    info!("Starting D&D Prediction Pipeline");

    // Load configuration; a missing file degrades to defaults so the
    // pipeline still answers.
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
    .unwrap_or_else(|error| {
        warn!(error = %error, "Unable to load configuration, using defaults");
        AppConfig::default()
    });

    info!(
        artifact_path = %config.model.artifact_path.display(),
        history_dir = %config.history.dir.display(),
        threshold = config.model.threshold,
        "Configuration loaded"
    );

    let pipeline = RiskPipeline::new(&config);
    let health = pipeline.health();
    info!(
        model_source = %health.model_source,
        model_accuracy = health.model_accuracy,
        "Pipeline initialized"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match serde_json::from_str::<ShipmentFeatures>(&line) {
            Ok(shipment) => pipeline.predict(&shipment),
            Err(error) => {
                warn!(error = %error, "Failed to deserialize shipment payload");
                PredictionOutcome::Failure(PredictionFailure::new(format!(
                    "invalid request payload: {error}"
                )))
            }
        };

        serde_json::to_writer(&mut out, &outcome)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }

    info!("Input drained, shutting down");
    pipeline.metrics().print_summary();

    Ok(())
}
