//! Per-row price ratios: `high / low`, `open / close`, and intrabar volatility.

use super::series::safe_div;
use super::{Indicator, Source};
use crate::domain::OhlcvRow;

/// `numerator / denominator` of two raw columns on the same row.
#[derive(Debug, Clone)]
pub struct Ratio {
    name: String,
    numerator: Source,
    denominator: Source,
}

impl Ratio {
    pub fn new(name: impl Into<String>, numerator: Source, denominator: Source) -> Self {
        Self {
            name: name.into(),
            numerator,
            denominator,
        }
    }

    pub fn high_low() -> Self {
        Self::new("high_low_ratio", Source::High, Source::Low)
    }

    pub fn open_close() -> Self {
        Self::new("open_close_ratio", Source::Open, Source::Close)
    }
}

impl Indicator for Ratio {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, rows: &[OhlcvRow]) -> Vec<f64> {
        rows.iter()
            .map(|r| safe_div(self.numerator.value(r), self.denominator.value(r)))
            .collect()
    }
}

/// Intrabar range as a percentage of close: `(high - low) / close * 100`.
#[derive(Debug, Clone, Default)]
pub struct Volatility;

impl Indicator for Volatility {
    fn name(&self) -> &str {
        "volatility"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, rows: &[OhlcvRow]) -> Vec<f64> {
        rows.iter()
            .map(|r| safe_div(r.high - r.low, r.close) * 100.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_rows, DEFAULT_EPSILON};

    #[test]
    fn high_low_ratio() {
        let rows = make_rows(&[100.0]);
        // high = 101, low = 99
        assert_approx(Ratio::high_low().compute(&rows)[0], 101.0 / 99.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_low_is_undefined() {
        let mut rows = make_rows(&[100.0]);
        rows[0].low = 0.0;
        assert!(Ratio::high_low().compute(&rows)[0].is_nan());
    }

    #[test]
    fn volatility_percent() {
        let rows = make_rows(&[100.0]);
        assert_approx(Volatility.compute(&rows)[0], 2.0, DEFAULT_EPSILON);
    }
}
