//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over data sources (Yahoo Finance,
//! CSV import, Parquet snapshots, synthetic series) so callers can swap
//! implementations and mock them in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::OhlcvRow;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider blocked requests for this session")]
    Blocked,

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data file for '{symbol}' at {path}")]
    NoDataFile { symbol: String, path: String },

    #[error("missing column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("invalid row {row} in {path}: {reason}")]
    InvalidRow {
        path: String,
        row: usize,
        reason: String,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for one symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    /// Ascending by timestamp.
    pub rows: Vec<OhlcvRow>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    ParquetImport,
    Synthetic,
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }
}

/// Trait for market data providers.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the most recent `lookback_days` daily rows for a symbol.
    fn fetch(&self, symbol: &str, lookback_days: usize) -> Result<FetchResult, DataError>;

    /// Whether the provider can currently serve requests.
    fn is_available(&self) -> bool;
}

/// Sort ascending, drop duplicate timestamps (last one wins), and keep the
/// trailing `lookback` rows.
pub fn finalize_rows(mut rows: Vec<OhlcvRow>, lookback: usize) -> Vec<OhlcvRow> {
    rows.sort_by_key(|r| r.timestamp);
    let mut deduped: Vec<OhlcvRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match deduped.last_mut() {
            Some(last) if last.timestamp == row.timestamp => *last = row,
            _ => deduped.push(row),
        }
    }
    let skip = deduped.len().saturating_sub(lookback);
    deduped.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::is_ascending;
    use crate::indicators::make_rows;

    #[test]
    fn finalize_sorts_dedupes_and_trims() {
        let mut rows = make_rows(&[1.0, 2.0, 3.0, 4.0]);
        rows.reverse();
        let mut dup = rows[0];
        dup.close = 99.0;
        rows.push(dup);

        let out = finalize_rows(rows, 3);
        assert_eq!(out.len(), 3);
        assert!(is_ascending(&out));
        assert_eq!(out[2].close, 99.0);
    }

    #[test]
    fn lookback_longer_than_history_keeps_everything() {
        let out = finalize_rows(make_rows(&[1.0, 2.0]), 60);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn data_source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DataSource::CsvImport).unwrap(),
            "\"csv_import\""
        );
        assert!(DataSource::Synthetic.is_synthetic());
    }
}
