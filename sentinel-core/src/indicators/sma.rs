//! Simple Moving Average (SMA).
//!
//! Rolling mean of a source column over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::series::rolling_mean;
use super::{Indicator, Source};
use crate::domain::OhlcvRow;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: Source,
    name: String,
}

impl Sma {
    /// SMA of close prices, named `sma_{period}`.
    pub fn new(period: usize) -> Self {
        Self::of(Source::Close, period)
    }

    /// SMA of an arbitrary source column. Non-close sources are named
    /// `{source}_sma_{period}`.
    pub fn of(source: Source, period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        let name = match source {
            Source::Close => format!("sma_{period}"),
            other => format!("{}_sma_{period}", other.label()),
        };
        Self {
            period,
            source,
            name,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, rows: &[OhlcvRow]) -> Vec<f64> {
        rolling_mean(&self.source.extract(rows), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_rows, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let rows = make_rows(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&rows);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn volume_sma_naming_and_values() {
        let mut rows = make_rows(&[1.0, 2.0, 3.0]);
        rows[0].volume = 100.0;
        rows[1].volume = 200.0;
        rows[2].volume = 600.0;
        let sma = Sma::of(Source::Volume, 3);
        assert_eq!(sma.name(), "volume_sma_3");
        assert_approx(sma.compute(&rows)[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(50).lookback(), 49);
        assert_eq!(Sma::new(1).lookback(), 0);
    }

    #[test]
    fn sma_too_few_rows() {
        let rows = make_rows(&[10.0, 11.0]);
        assert!(Sma::new(5).compute(&rows).iter().all(|v| v.is_nan()));
    }
}
