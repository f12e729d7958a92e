//! OhlcvRow: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names of the raw price/volume columns every input frame must provide.
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// One OHLCV row of a price series.
///
/// Volume is a real number: crypto venues report fractional base-asset volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvRow {
    /// Returns the first OHLCV field that is not a finite number, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .zip(OHLCV_COLUMNS)
            .find(|(v, _)| !v.is_finite())
            .map(|(_, name)| name)
    }

    /// Basic sanity check: finite fields, high >= low, positive prices, non-negative volume.
    pub fn is_sane(&self) -> bool {
        self.missing_field().is_none()
            && self.high >= self.low
            && self.low > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// Returns true if rows are in strictly ascending timestamp order.
pub fn is_ascending(rows: &[OhlcvRow]) -> bool {
    rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}
