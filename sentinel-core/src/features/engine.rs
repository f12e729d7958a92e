//! Feature engineering engine.
//!
//! Turns raw OHLCV rows into a [`FeatureFrame`] holding the raw columns plus
//! every derived indicator the reconstruction model may have been trained on.

use thiserror::Error;
use tracing::debug;

use super::frame::FeatureFrame;
use crate::domain::{OhlcvRow, OHLCV_COLUMNS};
use crate::indicators::series::{pct_change, ratio, rolling_mean};
use crate::indicators::{
    Indicator, Obv, PctChange, Ratio, RollingRsi, Sma, Source, Volatility,
};

/// Failure to derive features from the input rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("no OHLCV rows to compute features from")]
    EmptyInput,

    #[error("missing required column '{column}' at row {row}")]
    MissingValue { row: usize, column: &'static str },

    #[error("negative volume {volume} at row {row}")]
    NegativeVolume { row: usize, volume: f64 },
}

/// Window lengths used by the derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    pub volume_ma_window: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            volume_ma_window: 7,
            sma_short: 30,
            sma_long: 50,
            rsi_period: 14,
        }
    }
}

impl FeatureConfig {
    /// Longest trailing window; frames shorter than this leave some columns
    /// defined only by filling.
    pub fn warmup(&self) -> usize {
        self.sma_long
            .max(self.sma_short)
            .max(self.rsi_period)
            .max(self.volume_ma_window)
    }
}

/// Feature engineering engine
#[derive(Debug, Clone, Default)]
pub struct FeatureEngine {
    config: FeatureConfig,
}

impl FeatureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Compute the full feature frame. Row order and count are preserved.
    pub fn compute(&self, rows: &[OhlcvRow]) -> Result<FeatureFrame, FeatureError> {
        validate_rows(rows)?;

        let n = rows.len();
        let cfg = &self.config;
        let mut frame = FeatureFrame::with_len(n);

        for source in [
            Source::Open,
            Source::High,
            Source::Low,
            Source::Close,
            Source::Volume,
        ] {
            frame.insert(source.label(), source.extract(rows));
        }

        let volume = Source::Volume.extract(rows);
        let sma_short = Sma::new(cfg.sma_short);
        let sma_long = Sma::new(cfg.sma_long);
        let sma_short_values = sma_short.compute(rows);
        let sma_long_values = sma_long.compute(rows);
        let obv = Obv::new().compute(rows);

        frame.insert("price_change", PctChange::price().compute(rows));
        frame.insert("high_low_ratio", Ratio::high_low().compute(rows));
        frame.insert("open_close_ratio", Ratio::open_close().compute(rows));
        frame.insert("volume_change", PctChange::volume().compute(rows));
        frame.insert(
            "volume_ma_ratio",
            ratio(&volume, &rolling_mean(&volume, cfg.volume_ma_window)),
        );
        frame.insert("sma_ratio", ratio(&sma_short_values, &sma_long_values));
        frame.insert(sma_short.name(), sma_short_values);
        frame.insert(sma_long.name(), sma_long_values);
        frame.insert("volatility", Volatility.compute(rows));
        frame.insert("rsi", RollingRsi::new(cfg.rsi_period).compute(rows));
        let obv_change = pct_change(&obv);
        frame.insert("obv", obv);
        frame.insert("obv_change", obv_change);

        frame.fill_undefined();

        let undefined = frame.undefined_columns();
        if !undefined.is_empty() {
            debug!(rows = n, columns = ?undefined, "feature columns left undefined after filling");
        }

        Ok(frame)
    }
}

/// Check that every row carries finite OHLCV values and non-negative volume.
pub fn validate_rows(rows: &[OhlcvRow]) -> Result<(), FeatureError> {
    if rows.is_empty() {
        return Err(FeatureError::EmptyInput);
    }
    for (i, row) in rows.iter().enumerate() {
        if let Some(column) = row.missing_field() {
            return Err(FeatureError::MissingValue { row: i, column });
        }
        if row.volume < 0.0 {
            return Err(FeatureError::NegativeVolume {
                row: i,
                volume: row.volume,
            });
        }
    }
    Ok(())
}

/// Names of every column [`FeatureEngine::compute`] produces with the default
/// config, in frame order.
pub fn feature_columns() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = OHLCV_COLUMNS.to_vec();
    names.extend([
        "price_change",
        "high_low_ratio",
        "open_close_ratio",
        "volume_change",
        "volume_ma_ratio",
        "sma_ratio",
        "sma_30",
        "sma_50",
        "volatility",
        "rsi",
        "obv",
        "obv_change",
    ]);
    names
}
