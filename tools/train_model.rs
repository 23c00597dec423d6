//! Offline Model Trainer
//!
//! Generates a synthetic shipment dataset, fits the scaler and forest,
//! evaluates on a holdout split, and persists the scoring artifact the
//! pipeline loads at startup.

use anyhow::Result;
use chrono::Utc;
use dd_prediction_pipeline::features::FEATURE_NAMES;
use dd_prediction_pipeline::models::artifact::{
    ArtifactMetadata, ScoringArtifact, SCHEMA_VERSION,
};
use dd_prediction_pipeline::models::forest::{ForestParams, RandomForest};
use dd_prediction_pipeline::models::scaler::StandardScaler;
use dd_prediction_pipeline::models::training;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

struct Evaluation {
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1: f64,
    auc_roc: f64,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("train_model=info".parse()?)
                .add_directive("dd_prediction_pipeline=info".parse()?),
        )
        .init();

    info!("Starting D&D model training");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let artifact_path = PathBuf::from(
        args.get(1)
            .map(String::as_str)
            .unwrap_or("models/dd_model.json"),
    );
    let n_samples: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10_000);
    let seed: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(42);

    info!(
        artifact_path = %artifact_path.display(),
        n_samples = n_samples,
        seed = seed,
        "Configuration loaded"
    );

    let mut rng = StdRng::seed_from_u64(seed);

    info!("Generating {} synthetic shipment samples...", n_samples);
    let dataset = training::shipment_dataset(n_samples, &mut rng);
    let positives = dataset.labels.iter().filter(|&&l| l == 1).count();
    info!(
        "Generated data with {} positive cases ({:.1}%)",
        positives,
        positives as f64 / n_samples as f64 * 100.0
    );

    // Scale, then split 80/20 for evaluation.
    let scaler = StandardScaler::fit(&dataset.rows);
    let scaled: Vec<Vec<f64>> = dataset.rows.iter().map(|row| scaler.transform(row)).collect();

    let mut order: Vec<usize> = (0..n_samples).collect();
    order.shuffle(&mut rng);
    let split = (n_samples as f64 * 0.8) as usize;

    let train_rows: Vec<Vec<f64>> = order[..split].iter().map(|&i| scaled[i].clone()).collect();
    let train_labels: Vec<u32> = order[..split].iter().map(|&i| dataset.labels[i]).collect();
    let test_rows: Vec<Vec<f64>> = order[split..].iter().map(|&i| scaled[i].clone()).collect();
    let test_labels: Vec<u32> = order[split..].iter().map(|&i| dataset.labels[i]).collect();

    info!(
        "Training set size: {}, test set size: {}",
        train_rows.len(),
        test_rows.len()
    );

    let params = ForestParams {
        n_estimators: 200,
        max_depth: 15,
        min_samples_split: 10,
        min_samples_leaf: 5,
    };
    info!("Training random forest ({} trees)...", params.n_estimators);
    let forest = RandomForest::fit(&train_rows, &train_labels, &params, &mut rng);

    info!("Evaluating on holdout set...");
    let evaluation = evaluate(&forest, &test_rows, &test_labels);
    info!(
        accuracy = format!("{:.4}", evaluation.accuracy),
        precision = format!("{:.4}", evaluation.precision),
        recall = format!("{:.4}", evaluation.recall),
        f1 = format!("{:.4}", evaluation.f1),
        auc_roc = format!("{:.4}", evaluation.auc_roc),
        "Holdout performance"
    );

    if let Some(importances) = forest.feature_importances() {
        let mut ranked: Vec<(&str, f64)> = FEATURE_NAMES
            .iter()
            .copied()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        info!("Top feature importances:");
        for (name, importance) in ranked.iter().take(10) {
            info!("  {}: {:.4}", name, importance);
        }
    }

    let metrics = BTreeMap::from([
        ("accuracy".to_string(), evaluation.accuracy * 100.0),
        ("precision".to_string(), evaluation.precision),
        ("recall".to_string(), evaluation.recall),
        ("f1_score".to_string(), evaluation.f1),
        ("auc_roc".to_string(), evaluation.auc_roc),
    ]);

    let artifact = ScoringArtifact {
        schema_version: SCHEMA_VERSION,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        scaler,
        forest,
        threshold: 0.5,
        metadata: ArtifactMetadata {
            model_version: "1.0.0".to_string(),
            trained_at: Utc::now(),
            metrics: metrics.clone(),
        },
    };
    artifact.save(&artifact_path)?;

    // Metrics sidecar next to the artifact for quick inspection.
    let sidecar = artifact_path.with_extension("metrics.json");
    std::fs::write(&sidecar, serde_json::to_string_pretty(&metrics)?)?;
    info!(path = %sidecar.display(), "Metrics sidecar saved");

    info!("Training completed successfully");
    Ok(())
}

fn evaluate(forest: &RandomForest, rows: &[Vec<f64>], labels: &[u32]) -> Evaluation {
    let probabilities: Vec<f64> = rows
        .iter()
        .map(|row| {
            let proba = forest.predict_proba(row);
            proba.last().copied().unwrap_or(0.0)
        })
        .collect();
    let predictions: Vec<u32> = probabilities.iter().map(|&p| u32::from(p >= 0.5)).collect();

    let mut tp = 0u64;
    let mut fp = 0u64;
    let mut tn = 0u64;
    let mut fn_ = 0u64;
    for (&predicted, &actual) in predictions.iter().zip(labels) {
        match (predicted, actual) {
            (1, 1) => tp += 1,
            (1, 0) => fp += 1,
            (0, 0) => tn += 1,
            _ => fn_ += 1,
        }
    }

    let accuracy = (tp + tn) as f64 / labels.len().max(1) as f64;
    let precision = tp as f64 / (tp + fp).max(1) as f64;
    let recall = tp as f64 / (tp + fn_).max(1) as f64;
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Evaluation {
        accuracy,
        precision,
        recall,
        f1,
        auc_roc: auc_roc(&probabilities, labels),
    }
}

/// Rank-based AUC (Mann-Whitney statistic).
fn auc_roc(probabilities: &[f64], labels: &[u32]) -> f64 {
    let mut ranked: Vec<(f64, u32)> = probabilities
        .iter()
        .copied()
        .zip(labels.iter().copied())
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n_positive = labels.iter().filter(|&&l| l == 1).count() as f64;
    let n_negative = labels.len() as f64 - n_positive;
    if n_positive == 0.0 || n_negative == 0.0 {
        return 0.5;
    }

    let positive_rank_sum: f64 = ranked
        .iter()
        .enumerate()
        .filter(|(_, (_, label))| *label == 1)
        .map(|(rank, _)| (rank + 1) as f64)
        .sum();

    (positive_rank_sum - n_positive * (n_positive + 1.0) / 2.0) / (n_positive * n_negative)
}
