//! Synthetic BTC-like daily series for development and provider failover.
//!
//! Prices scatter around 40 000 with a standard deviation of 1 000; volume is
//! exponential with mean 1e10. Each symbol gets its own deterministic stream.
//! These are clearly fake and tagged as synthetic.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::Rng;

use super::provider::{DataError, DataSource, FetchResult, MarketDataProvider};
use crate::domain::OhlcvRow;
use crate::rng::RngHierarchy;

pub const DEFAULT_SYNTHETIC_DAYS: usize = 60;
const BASE_PRICE: f64 = 40_000.0;
const PRICE_SPREAD: f64 = 1_000.0;
const MEAN_VOLUME: f64 = 1e10;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seeds: RngHierarchy,
    start: DateTime<Utc>,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seeds: RngHierarchy::new(seed),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default(),
        }
    }

    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn generate(&self, symbol: &str, days: usize) -> Vec<OhlcvRow> {
        let mut rng = self.seeds.rng_for(symbol, 0);
        (0..days)
            .map(|i| {
                let open = BASE_PRICE + standard_normal(&mut rng) * PRICE_SPREAD;
                let close = BASE_PRICE + standard_normal(&mut rng) * PRICE_SPREAD;
                let high = open.max(close) + standard_normal(&mut rng).abs() * PRICE_SPREAD * 0.5;
                let low = open.min(close) - standard_normal(&mut rng).abs() * PRICE_SPREAD * 0.5;
                let volume = exponential(&mut rng, MEAN_VOLUME);
                OhlcvRow {
                    timestamp: self.start + Duration::days(i as i64),
                    open,
                    high,
                    low,
                    close,
                    volume,
                }
            })
            .collect()
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, lookback_days: usize) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            rows: self.generate(symbol, lookback_days),
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Inverse-CDF sample with the given mean.
fn exponential(rng: &mut StdRng, mean: f64) -> f64 {
    let u: f64 = rng.gen();
    -mean * (1.0 - u).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::is_ascending;
    use crate::features::validate_rows;

    #[test]
    fn sixty_daily_rows_by_default() {
        let rows = SyntheticProvider::default().generate("BTC-USD", DEFAULT_SYNTHETIC_DAYS);
        assert_eq!(rows.len(), 60);
        assert!(is_ascending(&rows));
        assert_eq!(rows[1].timestamp - rows[0].timestamp, Duration::days(1));
        assert!(validate_rows(&rows).is_ok());
    }

    #[test]
    fn same_symbol_same_series() {
        let p = SyntheticProvider::default();
        assert_eq!(p.generate("BTC-USD", 30), p.generate("BTC-USD", 30));
        assert_ne!(p.generate("BTC-USD", 30), p.generate("ETH-USD", 30));
    }

    #[test]
    fn bars_are_coherent_and_btc_like() {
        let rows = SyntheticProvider::default().generate("BTC-USD", 500);
        for r in &rows {
            assert!(r.is_sane());
            assert!(r.high >= r.open.max(r.close));
            assert!(r.low <= r.open.min(r.close));
        }
        let mean_close = rows.iter().map(|r| r.close).sum::<f64>() / rows.len() as f64;
        let mean_volume = rows.iter().map(|r| r.volume).sum::<f64>() / rows.len() as f64;
        assert!((mean_close - BASE_PRICE).abs() < 300.0);
        assert!(mean_volume > 0.7e10 && mean_volume < 1.3e10);
    }

    #[test]
    fn provider_tags_synthetic() {
        let result = SyntheticProvider::default().fetch("BTC-USD", 10).unwrap();
        assert_eq!(result.rows.len(), 10);
        assert!(result.source.is_synthetic());
    }
}
