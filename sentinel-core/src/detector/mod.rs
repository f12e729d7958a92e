//! Detectors: the primary reconstruction detector and the isolation-forest
//! fallback. Both return a [`Detection`]; the orchestrator decides labels.

pub mod fallback;
pub mod isolation_forest;
pub mod reconstruction;

pub use fallback::{FallbackDetector, FallbackError, FALLBACK_FEATURES};
pub use isolation_forest::{IsolationForest, IsolationForestConfig};
pub use reconstruction::{confidence_for, mean_absolute_error, DetectionError, ReconstructionDetector};

use crate::domain::{AnomalyResult, ModelStatus};
use chrono::Utc;

/// Verdict from a single detector, before provenance labels are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub is_anomaly: bool,
    pub anomaly_score: f64,
    pub reconstruction_error: Option<f64>,
    pub threshold: f64,
    pub confidence: f64,
    pub features_used: Vec<String>,
}

impl Detection {
    pub fn into_result(self, model_type: &str, model_status: ModelStatus) -> AnomalyResult {
        AnomalyResult {
            is_anomaly: self.is_anomaly,
            anomaly_score: self.anomaly_score,
            reconstruction_error: self.reconstruction_error,
            threshold: self.threshold,
            confidence: self.confidence,
            timestamp: Utc::now(),
            model_type: model_type.to_string(),
            symbol: String::new(),
            data_points: 0,
            model_status,
            features_used: self.features_used,
            error: None,
            message: None,
        }
    }
}
