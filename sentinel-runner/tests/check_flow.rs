//! Integration tests for the check flow: config → provider → orchestrator → alert log.

use std::fs;
use std::path::Path;

use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use sentinel_core::data::{write_csv, DataSource, SyntheticProvider};
use sentinel_core::domain::{AnomalyResult, ModelStatus, PRIMARY_MODEL_TYPE};
use sentinel_core::AnomalyOrchestrator;
use sentinel_runner::{
    build_provider, run_check, AlertDraft, AlertLog, LoadOptions, ProviderKind, SentinelConfig,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn zeros(r: usize, c: usize) -> serde_json::Value {
    json!(vec![vec![0.0; c]; r])
}

/// Zero-weight autoencoder over `volatility` whose scaler mean sits far from
/// any real series, so every window is anomalous.
fn write_anomalous_artifacts(dir: &Path) {
    let units = 2;
    let model = json!({
        "layers": [
            {"type": "lstm", "kernel": zeros(1, 4 * units), "recurrent_kernel": zeros(units, 4 * units),
             "bias": vec![0.0; 4 * units]},
            {"type": "repeat_vector", "n": 30},
            {"type": "lstm", "kernel": zeros(units, 4 * units), "recurrent_kernel": zeros(units, 4 * units),
             "bias": vec![0.0; 4 * units], "return_sequences": true},
            {"type": "dense", "kernel": zeros(units, 1), "bias": [0.0]}
        ]
    });
    let scaler = json!({"kind": "standard", "feature_names": ["volatility"], "mean": [-1000.0], "scale": [1.0]});
    let metadata = json!({"sequence_length": 30, "threshold": 0.1, "feature_names": ["volatility"]});
    fs::write(dir.join("lstm_autoencoder.json"), model.to_string()).unwrap();
    fs::write(dir.join("scaler.json"), scaler.to_string()).unwrap();
    fs::write(dir.join("model_metadata.json"), metadata.to_string()).unwrap();
}

fn config_for(root: &Path, provider: &str) -> SentinelConfig {
    let text = format!(
        r#"
        [artifacts]
        dir = "{models}"

        [market_data]
        provider = "{provider}"
        data_dir = "{data}"
        synthetic_fallback = false

        [alerts]
        log_path = "{log}"
        "#,
        models = root.join("models").display(),
        data = root.join("data").display(),
        log = root.join("alerts.jsonl").display(),
    );
    SentinelConfig::from_toml(&text).unwrap()
}

// ── Flows ────────────────────────────────────────────────────────────

#[test]
fn primary_anomaly_from_csv_is_logged() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("models")).unwrap();
    write_anomalous_artifacts(&root.path().join("models"));
    let rows = SyntheticProvider::default().generate("BTC-USD", 60);
    write_csv(&root.path().join("data/BTC-USD.csv"), &rows).unwrap();

    let config = config_for(root.path(), "csv");
    let orchestrator = AnomalyOrchestrator::initialize(&config.artifacts.paths());
    assert!(orchestrator.state().is_loaded());

    let provider = build_provider(&config.market_data).unwrap();
    let log = AlertLog::new(config.alerts.log_path.clone().unwrap());
    let report = run_check(
        "BTC",
        &orchestrator,
        provider.as_ref(),
        &LoadOptions::from(&config.market_data),
        Some(&log),
    )
    .unwrap();

    assert_eq!(report.source, DataSource::CsvImport);
    assert_eq!(report.result.model_status, ModelStatus::RealModel);
    assert!(report.result.is_anomaly);
    let alert = report.alert.unwrap();
    assert_eq!(alert.cryptocurrency, "BTC");
    assert_eq!(Some(alert.current_value), report.result.reconstruction_error);
    assert_eq!(log.read_all().unwrap(), vec![alert]);
}

#[test]
fn missing_snapshot_without_fallback_is_an_error() {
    let root = TempDir::new().unwrap();
    let config = config_for(root.path(), "parquet");
    let orchestrator = AnomalyOrchestrator::initialize(&config.artifacts.paths());
    assert!(!orchestrator.state().is_loaded());

    let provider = build_provider(&config.market_data).unwrap();
    let err = run_check(
        "ETH-USD",
        &orchestrator,
        provider.as_ref(),
        &LoadOptions::from(&config.market_data),
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("ETH-USD"));
}

#[test]
fn missing_snapshot_with_fallback_scores_synthetic_rows() {
    let root = TempDir::new().unwrap();
    let mut config = config_for(root.path(), "csv");
    config.market_data.synthetic_fallback = true;
    let orchestrator = AnomalyOrchestrator::initialize(&config.artifacts.paths());

    let provider = build_provider(&config.market_data).unwrap();
    let report = run_check(
        "SOL",
        &orchestrator,
        provider.as_ref(),
        &LoadOptions::from(&config.market_data),
        None,
    )
    .unwrap();
    assert_eq!(report.symbol, "SOL-USD");
    assert!(report.source.is_synthetic());
    assert_eq!(report.result.model_status, ModelStatus::DemoModel);
    assert!(report.alert.is_none());
}

#[test]
fn synthetic_provider_kind_needs_no_files() {
    let root = TempDir::new().unwrap();
    let config = config_for(root.path(), "synthetic");
    assert_eq!(config.market_data.provider, ProviderKind::Synthetic);
    let provider = build_provider(&config.market_data).unwrap();
    let report = run_check(
        "BTC-USD",
        &AnomalyOrchestrator::unavailable("none"),
        provider.as_ref(),
        &LoadOptions::from(&config.market_data),
        None,
    )
    .unwrap();
    assert_eq!(report.result.data_points, 60);
}

// ── Alert gating (proptest) ──────────────────────────────────────────

fn arb_status() -> impl Strategy<Value = ModelStatus> {
    prop_oneof![
        Just(ModelStatus::RealModel),
        Just(ModelStatus::RealModelFailed),
        Just(ModelStatus::DemoModel),
        Just(ModelStatus::Error),
    ]
}

proptest! {
    #[test]
    fn alert_only_for_clean_primary_anomalies(
        status in arb_status(),
        is_anomaly in any::<bool>(),
        has_error in any::<bool>(),
        error in 0.0..10.0_f64,
    ) {
        let result = AnomalyResult {
            is_anomaly,
            anomaly_score: error / 0.1,
            reconstruction_error: status.is_primary().then_some(error),
            threshold: 0.1,
            confidence: 0.5,
            timestamp: Utc::now(),
            model_type: PRIMARY_MODEL_TYPE.to_string(),
            symbol: "BTC-USD".to_string(),
            data_points: 60,
            model_status: status,
            features_used: Vec::new(),
            error: has_error.then(|| "boom".to_string()),
            message: None,
        };
        let drafted = AlertDraft::from_result(&result).is_some();
        prop_assert_eq!(drafted, status == ModelStatus::RealModel && is_anomaly && !has_error);
    }
}
