//! Percent change of a source column vs the previous row.
//!
//! Lookback: 1 (the first row is undefined).

use super::series::pct_change;
use super::{Indicator, Source};
use crate::domain::OhlcvRow;

#[derive(Debug, Clone)]
pub struct PctChange {
    source: Source,
    name: String,
}

impl PctChange {
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        Self {
            source,
            name: name.into(),
        }
    }

    /// `price_change`: percent change of close.
    pub fn price() -> Self {
        Self::new("price_change", Source::Close)
    }

    /// `volume_change`: percent change of volume.
    pub fn volume() -> Self {
        Self::new("volume_change", Source::Volume)
    }
}

impl Indicator for PctChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, rows: &[OhlcvRow]) -> Vec<f64> {
        pct_change(&self.source.extract(rows))
    }
}
