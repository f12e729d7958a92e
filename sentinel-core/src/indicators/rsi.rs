//! Relative Strength Index with simple rolling means.
//!
//! gains = positive close deltas, losses = magnitude of negative deltas
//! (the first row has no delta and counts as 0 for both).
//! RSI = 100 - 100 / (1 + mean(gains) / mean(losses)) over `period` rows.
//! Lookback: period - 1.
//! A zero average loss with gains saturates at 100; a window with neither
//! gains nor losses is undefined.

use super::series::{rolling_mean, safe_div};
use super::Indicator;
use crate::domain::OhlcvRow;

#[derive(Debug, Clone)]
pub struct RollingRsi {
    period: usize,
    name: String,
}

impl RollingRsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: "rsi".to_string(),
        }
    }
}

impl Indicator for RollingRsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, rows: &[OhlcvRow]) -> Vec<f64> {
        let n = rows.len();
        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let delta = rows[i].close - rows[i - 1].close;
            if delta > 0.0 {
                gains[i] = delta;
            } else if delta < 0.0 {
                losses[i] = -delta;
            }
        }

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| {
                if g.is_nan() || l.is_nan() {
                    return f64::NAN;
                }
                if l == 0.0 {
                    return if g > 0.0 { 100.0 } else { f64::NAN };
                }
                100.0 - 100.0 / (1.0 + safe_div(g, l))
            })
            .collect()
    }
}
