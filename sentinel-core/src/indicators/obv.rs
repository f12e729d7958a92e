//! On-Balance Volume (OBV).
//!
//! Cumulative sum of signed volume, the sign being the sign of the close
//! delta. The first row and zero deltas contribute nothing.
//! Lookback: 0.

use super::Indicator;
use crate::domain::OhlcvRow;

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, rows: &[OhlcvRow]) -> Vec<f64> {
        let mut out = Vec::with_capacity(rows.len());
        let mut running = 0.0;
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                let delta = row.close - rows[i - 1].close;
                if delta > 0.0 {
                    running += row.volume;
                } else if delta < 0.0 {
                    running -= row.volume;
                }
            }
            out.push(running);
        }
        out
    }
}
