//! Anomaly orchestrator: routes each call to the primary detector when the
//! artifact bundle is loaded, otherwise (or on failure) to the fallback, and
//! labels the result with where it came from.
//!
//! `analyze` never fails: every error is logged and folded into an
//! [`AnomalyResult`] with `error` set and safe defaults.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::artifacts::{load_bundle, ArtifactBundle, ArtifactPaths};
use crate::detector::{FallbackDetector, ReconstructionDetector};
use crate::domain::{
    AnomalyResult, ModelStatus, OhlcvRow, FALLBACK_FAILED_MODEL_TYPE, FALLBACK_MODEL_TYPE,
    PRIMARY_MODEL_TYPE,
};

/// Whether the primary detector is usable. Decided once at construction.
#[derive(Debug, Clone)]
pub enum ModelState {
    Loaded(Box<ReconstructionDetector>),
    Unavailable { reason: String },
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded(_))
    }
}

/// Snapshot of the loaded model, for health endpoints and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub model_loaded: bool,
    pub model_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnomalyOrchestrator {
    state: ModelState,
    fallback: FallbackDetector,
}

impl AnomalyOrchestrator {
    /// Load the artifact bundle; any failure leaves the orchestrator in
    /// fallback-only mode for its whole lifetime.
    pub fn initialize(paths: &ArtifactPaths) -> Self {
        match load_bundle(paths) {
            Ok(bundle) => Self::with_bundle(bundle),
            Err(e) => {
                match e.path() {
                    Some(path) => warn!(path = %path.display(), error = %e, "model artifacts unavailable, using fallback detector"),
                    None => warn!(error = %e, "model artifacts unavailable, using fallback detector"),
                }
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn with_bundle(bundle: ArtifactBundle) -> Self {
        Self::from_state(ModelState::Loaded(Box::new(ReconstructionDetector::new(bundle))))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::from_state(ModelState::Unavailable {
            reason: reason.into(),
        })
    }

    pub fn from_state(state: ModelState) -> Self {
        Self {
            state,
            fallback: FallbackDetector::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackDetector) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Score the latest rows for `symbol`.
    pub fn analyze(&self, symbol: &str, rows: &[OhlcvRow]) -> AnomalyResult {
        let data_points = rows.len();

        let result = match &self.state {
            ModelState::Loaded(detector) => match detector.detect(rows) {
                Ok(detection) => {
                    info!(
                        symbol,
                        is_anomaly = detection.is_anomaly,
                        score = detection.anomaly_score,
                        "primary detector scored"
                    );
                    detection.into_result(PRIMARY_MODEL_TYPE, ModelStatus::RealModel)
                }
                Err(e) => {
                    warn!(symbol, rows = data_points, error = %e, "primary detector failed, falling back");
                    self.run_fallback(
                        rows,
                        ModelStatus::RealModelFailed,
                        format!("Real model failed: {e}. Using demo detection."),
                    )
                }
            },
            ModelState::Unavailable { .. } => self.run_fallback(
                rows,
                ModelStatus::DemoModel,
                "Real model not available. Using demo detection.".to_string(),
            ),
        };

        result.annotate(symbol, data_points)
    }

    fn run_fallback(&self, rows: &[OhlcvRow], status: ModelStatus, message: String) -> AnomalyResult {
        match self.fallback.score(rows) {
            Ok(detection) => detection
                .into_result(FALLBACK_MODEL_TYPE, status)
                .with_message(message),
            Err(e) => {
                error!(error = %e, "fallback detector failed");
                AnomalyResult::failed(e.to_string(), FALLBACK_FAILED_MODEL_TYPE, status)
                    .with_message(message)
            }
        }
    }

    pub fn status(&self) -> StatusReport {
        match &self.state {
            ModelState::Loaded(detector) => StatusReport {
                model_loaded: true,
                model_type: PRIMARY_MODEL_TYPE.to_string(),
                status: "ready".to_string(),
                sequence_length: Some(detector.sequence_length()),
                threshold: Some(detector.threshold()),
                feature_count: Some(detector.feature_count()),
                fingerprint: Some(detector.bundle().fingerprint.clone()),
                reason: None,
            },
            ModelState::Unavailable { reason } => StatusReport {
                model_loaded: false,
                model_type: FALLBACK_MODEL_TYPE.to_string(),
                status: "demo_mode".to_string(),
                sequence_length: None,
                threshold: None,
                feature_count: None,
                fingerprint: None,
                reason: Some(reason.clone()),
            },
        }
    }
}
