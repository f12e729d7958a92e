//! Concrete indicator implementations.
//!
//! Every indicator implements [`Indicator`]: a pure function from the full row
//! history to a series of the same length. Warmup positions (and any position
//! where a division by zero occurs) are `f64::NAN`; the feature engine decides
//! how those are filled.

pub mod change;
pub mod obv;
pub mod ratio;
pub mod rsi;
pub mod series;
pub mod sma;

pub use change::PctChange;
pub use obv::Obv;
pub use ratio::{Ratio, Volatility};
pub use rsi::RollingRsi;
pub use sma::Sma;

use crate::domain::OhlcvRow;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No value at row t may depend on rows t+1 or later.
pub trait Indicator: Send + Sync {
    /// Column name produced by this indicator (e.g., "sma_30").
    fn name(&self) -> &str;

    /// Number of rows needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire row series.
    fn compute(&self, rows: &[OhlcvRow]) -> Vec<f64>;
}

/// Raw OHLCV column an indicator reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Source {
    pub fn value(&self, row: &OhlcvRow) -> f64 {
        match self {
            Source::Open => row.open,
            Source::High => row.high,
            Source::Low => row.low,
            Source::Close => row.close,
            Source::Volume => row.volume,
        }
    }

    pub fn extract(&self, rows: &[OhlcvRow]) -> Vec<f64> {
        rows.iter().map(|r| self.value(r)).collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::Open => "open",
            Source::High => "high",
            Source::Low => "low",
            Source::Close => "close",
            Source::Volume => "volume",
        }
    }
}

/// Create synthetic daily rows from close prices for testing.
///
/// open = prev_close (or close for the first row), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_rows(closes: &[f64]) -> Vec<OhlcvRow> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            OhlcvRow {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
