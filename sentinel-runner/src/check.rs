//! One-shot market check: load rows → analyze → draft alert.
//!
//! Two entry points:
//! - `run_check()`: loads rows through a provider, then scores them. Used by the CLI.
//! - `check_rows()`: scores pre-loaded rows. No I/O beyond the alert log.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use sentinel_core::data::{DataSource, MarketDataProvider};
use sentinel_core::domain::{normalize_symbol, AnomalyResult};
use sentinel_core::AnomalyOrchestrator;

use crate::alerts::{AlertDraft, AlertLog};
use crate::data_loader::{load_rows, LoadError, LoadOptions, LoadedRows};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("failed to write alert log: {0}")]
    AlertLog(#[from] std::io::Error),
}

/// Everything one check produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub symbol: String,
    pub source: DataSource,
    pub dataset_hash: String,
    pub result: AnomalyResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertDraft>,
}

/// Load rows for `symbol` and score them.
pub fn run_check(
    symbol: &str,
    orchestrator: &AnomalyOrchestrator,
    provider: &dyn MarketDataProvider,
    opts: &LoadOptions,
    alert_log: Option<&AlertLog>,
) -> Result<CheckReport, CheckError> {
    let symbol = normalize_symbol(symbol);
    let loaded = load_rows(&symbol, provider, opts)?;
    check_rows(orchestrator, loaded, alert_log)
}

/// Score pre-loaded rows and draft an alert when warranted.
pub fn check_rows(
    orchestrator: &AnomalyOrchestrator,
    loaded: LoadedRows,
    alert_log: Option<&AlertLog>,
) -> Result<CheckReport, CheckError> {
    let result = orchestrator.analyze(&loaded.symbol, &loaded.rows);
    if let Some(error) = &result.error {
        warn!(symbol = %loaded.symbol, error = %error, "analysis failed");
    }

    let alert = AlertDraft::from_result(&result);
    match (&alert, alert_log) {
        (Some(draft), Some(log)) => {
            log.append(draft)?;
            info!(
                symbol = %loaded.symbol,
                score = result.anomaly_score,
                path = %log.path().display(),
                "anomaly alert logged"
            );
        }
        (Some(_), None) => info!(symbol = %loaded.symbol, score = result.anomaly_score, "anomaly detected"),
        (None, _) => info!(
            symbol = %loaded.symbol,
            status = result.model_status.as_str(),
            is_anomaly = result.is_anomaly,
            "no alert raised"
        ),
    }

    Ok(CheckReport {
        symbol: loaded.symbol,
        source: loaded.source,
        dataset_hash: loaded.dataset_hash,
        result,
        alert,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::data::SyntheticProvider;
    use sentinel_core::domain::ModelStatus;
    use tempfile::TempDir;

    #[test]
    fn demo_check_never_alerts() {
        let dir = TempDir::new().unwrap();
        let log = AlertLog::new(dir.path().join("alerts.jsonl"));
        let orchestrator = AnomalyOrchestrator::unavailable("no artifacts");

        let report = run_check(
            "btc",
            &orchestrator,
            &SyntheticProvider::default(),
            &LoadOptions::default(),
            Some(&log),
        )
        .unwrap();

        assert_eq!(report.symbol, "BTC-USD");
        assert_eq!(report.result.model_status, ModelStatus::DemoModel);
        assert_eq!(report.result.data_points, 60);
        assert!(report.source.is_synthetic());
        assert!(report.alert.is_none());
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn report_serializes_without_alert_field() {
        let orchestrator = AnomalyOrchestrator::unavailable("no artifacts");
        let report = run_check(
            "ETH-USD",
            &orchestrator,
            &SyntheticProvider::default(),
            &LoadOptions::default(),
            None,
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("alert").is_none());
        assert_eq!(json["source"], "synthetic");
        assert_eq!(json["result"]["model_status"], "demo_model");
    }
}
