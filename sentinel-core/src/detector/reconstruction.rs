//! Primary detector: scale the trailing window, reconstruct it with the frozen
//! model, and compare the mean absolute reconstruction error to the threshold.

use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

use super::Detection;
use crate::artifacts::ArtifactBundle;
use crate::domain::OhlcvRow;
use crate::features::{FeatureEngine, FeatureError};
use crate::model::InferenceError;
use crate::window::{SequenceWindower, WindowError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("feature computation failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("{0}")]
    Window(#[from] WindowError),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
}

#[derive(Debug, Clone)]
pub struct ReconstructionDetector {
    engine: FeatureEngine,
    windower: SequenceWindower,
    bundle: ArtifactBundle,
}

impl ReconstructionDetector {
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self::with_engine(bundle, FeatureEngine::new())
    }

    pub fn with_engine(bundle: ArtifactBundle, engine: FeatureEngine) -> Self {
        let windower = SequenceWindower::new(
            bundle.metadata.feature_names.clone(),
            bundle.metadata.sequence_length,
        );
        Self {
            engine,
            windower,
            bundle,
        }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn sequence_length(&self) -> usize {
        self.bundle.metadata.sequence_length
    }

    pub fn threshold(&self) -> f64 {
        self.bundle.metadata.threshold
    }

    pub fn feature_count(&self) -> usize {
        self.bundle.metadata.feature_names.len()
    }

    pub fn detect(&self, rows: &[OhlcvRow]) -> Result<Detection, DetectionError> {
        let frame = self.engine.compute(rows)?;
        let window = self.windower.window(&frame)?;
        let scaled = self
            .bundle
            .scaler
            .transform(&window.feature_names, &window.values)?;
        let reconstructed = self.bundle.model.reconstruct(&scaled)?;
        let error = mean_absolute_error(&scaled, &reconstructed)?;

        let threshold = self.threshold();
        let anomaly_score = error / threshold;
        debug!(
            features = window.feature_count(),
            error,
            threshold,
            "reconstruction scored"
        );

        Ok(Detection {
            is_anomaly: error > threshold,
            anomaly_score,
            reconstruction_error: Some(error),
            threshold,
            confidence: confidence_for(anomaly_score),
            features_used: window.feature_names,
        })
    }
}

/// Mean of `|a - b|` over every entry.
pub fn mean_absolute_error(a: &Array2<f64>, b: &Array2<f64>) -> Result<f64, InferenceError> {
    if a.dim() != b.dim() {
        return Err(InferenceError::ShapeMismatch {
            expected: a.dim(),
            actual: b.dim(),
        });
    }
    let mae = (a - b)
        .mapv(f64::abs)
        .mean()
        .filter(|v| v.is_finite())
        .ok_or(InferenceError::NonFinite {
            stage: "reconstruction error",
        })?;
    Ok(mae)
}

/// `1 - min(score, 2) / 2`: 1 at a perfect reconstruction, 0 at twice the
/// threshold or beyond.
pub fn confidence_for(score: f64) -> f64 {
    1.0 - score.clamp(0.0, 2.0) / 2.0
}
