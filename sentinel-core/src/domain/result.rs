//! AnomalyResult: the per-call verdict handed to API/task collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model type label for results produced by the primary detector.
pub const PRIMARY_MODEL_TYPE: &str = "LSTM Autoencoder";
/// Model type label for results produced by the fallback detector.
pub const FALLBACK_MODEL_TYPE: &str = "Demo (Isolation Forest)";
/// Model type label when the fallback detector itself could not run.
pub const FALLBACK_FAILED_MODEL_TYPE: &str = "Demo (Failed)";
/// Model type label when no detector could run at all.
pub const ERROR_MODEL_TYPE: &str = "Error";

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// The primary reconstruction detector produced the verdict.
    RealModel,
    /// Artifacts were loaded but the primary detector failed for this call;
    /// the verdict comes from the fallback detector.
    RealModelFailed,
    /// Artifacts are unavailable for this process; fallback detector only.
    DemoModel,
    /// No detector could run.
    Error,
}

impl ModelStatus {
    /// True only for verdicts from the trained detector.
    pub fn is_primary(&self) -> bool {
        matches!(self, ModelStatus::RealModel)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStatus::RealModel => "real_model",
            ModelStatus::RealModelFailed => "real_model_failed",
            ModelStatus::DemoModel => "demo_model",
            ModelStatus::Error => "error",
        }
    }
}

/// Outcome of one `analyze` call.
///
/// Always structurally valid: failures carry `error` plus the safe defaults
/// `is_anomaly = false`, `anomaly_score = 0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub is_anomaly: bool,
    pub anomaly_score: f64,
    /// Mean absolute reconstruction error. Only the primary path sets this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconstruction_error: Option<f64>,
    pub threshold: f64,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub model_type: String,
    pub symbol: String,
    pub data_points: usize,
    pub model_status: ModelStatus,
    pub features_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnomalyResult {
    /// A failure result with safe defaults.
    pub fn failed(error: impl Into<String>, model_type: &str, model_status: ModelStatus) -> Self {
        Self {
            is_anomaly: false,
            anomaly_score: 0.0,
            reconstruction_error: None,
            threshold: 0.0,
            confidence: 0.0,
            timestamp: Utc::now(),
            model_type: model_type.to_string(),
            symbol: String::new(),
            data_points: 0,
            model_status,
            features_used: Vec::new(),
            error: Some(error.into()),
            message: None,
        }
    }

    /// Attach the symbol and input row count.
    pub fn annotate(mut self, symbol: &str, data_points: usize) -> Self {
        self.symbol = symbol.to_string();
        self.data_points = data_points;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_has_safe_defaults() {
        let r = AnomalyResult::failed("boom", ERROR_MODEL_TYPE, ModelStatus::Error);
        assert!(!r.is_anomaly);
        assert_eq!(r.anomaly_score, 0.0);
        assert_eq!(r.error.as_deref(), Some("boom"));
        assert!(r.is_error());
    }

    #[test]
    fn model_status_serializes_snake_case() {
        let json = serde_json::to_string(&ModelStatus::RealModelFailed).unwrap();
        assert_eq!(json, "\"real_model_failed\"");
        assert_eq!(ModelStatus::DemoModel.as_str(), "demo_model");
    }

    #[test]
    fn annotate_sets_symbol_and_rows() {
        let r = AnomalyResult::failed("x", ERROR_MODEL_TYPE, ModelStatus::Error).annotate("BTC-USD", 60);
        assert_eq!(r.symbol, "BTC-USD");
        assert_eq!(r.data_points, 60);
    }

    #[test]
    fn only_real_model_is_primary() {
        assert!(ModelStatus::RealModel.is_primary());
        assert!(!ModelStatus::RealModelFailed.is_primary());
        assert!(!ModelStatus::DemoModel.is_primary());
    }
}
