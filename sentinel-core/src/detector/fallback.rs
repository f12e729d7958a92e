//! Fallback detector used when the reconstruction model is unavailable or
//! fails for a call.
//!
//! Fits an isolation forest on three cheap features over the whole history
//! and scores the most recent row. The verdict comes without a
//! reconstruction error.

use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

use super::isolation_forest::{IsolationForest, IsolationForestConfig};
use super::Detection;
use crate::domain::OhlcvRow;
use crate::features::FeatureError;
use crate::indicators::{Indicator, PctChange, Volatility};

pub const FALLBACK_FEATURES: [&str; 3] = ["price_change", "volume_change", "volatility"];

/// Band for flagged rows.
const ANOMALY_BAND: (f64, f64) = (0.7, 1.0);
/// Band for unflagged rows.
const NORMAL_BAND: (f64, f64) = (0.1, 0.6);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FallbackError {
    #[error("fallback feature computation failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("no usable rows for fallback scoring ({rows} rows had undefined features)")]
    NoUsableRows { rows: usize },
}

#[derive(Debug, Clone, Default)]
pub struct FallbackDetector {
    config: IsolationForestConfig,
}

impl FallbackDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IsolationForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    pub fn score(&self, rows: &[OhlcvRow]) -> Result<Detection, FallbackError> {
        if rows.is_empty() {
            return Err(FeatureError::EmptyInput.into());
        }

        let data = fallback_matrix(rows);
        let usable = data.nrows();
        let forest = IsolationForest::fit(&data, &self.config)
            .ok_or(FallbackError::NoUsableRows { rows: rows.len() })?;

        let score = forest.score(data.row(usable - 1));
        let threshold = forest.threshold();
        let is_anomaly = forest.is_outlier(score);
        let (anomaly_score, confidence) = band(score, threshold, is_anomaly);

        debug!(
            rows = rows.len(),
            usable,
            score,
            threshold,
            is_anomaly,
            "fallback forest scored latest row"
        );

        Ok(Detection {
            is_anomaly,
            anomaly_score,
            reconstruction_error: None,
            threshold,
            confidence,
            features_used: FALLBACK_FEATURES.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Rows with all three fallback features defined, oldest first.
///
/// The first row has no previous value; its percent changes count as 0.
fn fallback_matrix(rows: &[OhlcvRow]) -> Array2<f64> {
    let mut price = PctChange::price().compute(rows);
    let mut volume = PctChange::volume().compute(rows);
    let volatility = Volatility.compute(rows);
    if let (Some(p), Some(v)) = (price.first_mut(), volume.first_mut()) {
        if !p.is_finite() {
            *p = 0.0;
        }
        if !v.is_finite() {
            *v = 0.0;
        }
    }

    let kept: Vec<[f64; 3]> = (0..rows.len())
        .map(|i| [price[i], volume[i], volatility[i]])
        .filter(|r| r.iter().all(|v| v.is_finite()))
        .collect();

    let mut data = Array2::zeros((kept.len(), FALLBACK_FEATURES.len()));
    for (i, r) in kept.iter().enumerate() {
        for (j, v) in r.iter().enumerate() {
            data[[i, j]] = *v;
        }
    }
    data
}

/// Map the raw forest score into the reporting band and a confidence.
///
/// Flagged rows land in `[0.7, 1.0]`, rising with the score's distance above
/// the threshold; other rows land in `[0.1, 0.6]`, rising as the score nears
/// the threshold. Confidence is that same normalised distance.
fn band(score: f64, threshold: f64, is_anomaly: bool) -> (f64, f64) {
    if is_anomaly {
        let headroom = (1.0 - threshold).max(f64::EPSILON);
        let t = ((score - threshold) / headroom).clamp(0.0, 1.0);
        (ANOMALY_BAND.0 + (ANOMALY_BAND.1 - ANOMALY_BAND.0) * t, t)
    } else {
        let t = if threshold > 0.0 {
            (score / threshold).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (NORMAL_BAND.0 + (NORMAL_BAND.1 - NORMAL_BAND.0) * t, 1.0 - t)
    }
}
