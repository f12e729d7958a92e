//! CSV import: one `{SYMBOL}.csv` file per symbol with a
//! `timestamp,open,high,low,close,volume` header.
//!
//! Timestamps may be RFC 3339 (`2024-01-01T00:00:00Z`) or plain dates
//! (`2024-01-01`, read as midnight UTC).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use super::provider::{finalize_rows, DataError, DataSource, FetchResult, MarketDataProvider};
use crate::domain::{OhlcvRow, OHLCV_COLUMNS};

pub const TIMESTAMP_COLUMN: &str = "timestamp";

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(&self, symbol: &str, lookback_days: usize) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::NoDataFile {
                symbol: symbol.to_string(),
                path: path.display().to_string(),
            });
        }
        let rows = read_csv(&path)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            rows: finalize_rows(rows, lookback_days),
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

/// Read every row of an OHLCV CSV file.
pub fn read_csv(path: &Path) -> Result<Vec<OhlcvRow>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let path_str = path.display().to_string();

    let index_of = |column: &str| -> Result<usize, DataError> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
            .ok_or_else(|| DataError::MissingColumn {
                column: column.to_string(),
                path: path_str.clone(),
            })
    };
    let ts_idx = index_of(TIMESTAMP_COLUMN)?;
    let mut value_idx = [0usize; 5];
    for (slot, column) in value_idx.iter_mut().zip(OHLCV_COLUMNS) {
        *slot = index_of(column)?;
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let invalid = |reason: String| DataError::InvalidRow {
            path: path_str.clone(),
            row: i + 1,
            reason,
        };

        let raw_ts = record.get(ts_idx).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| invalid(format!("bad timestamp '{raw_ts}'")))?;

        let mut values = [0.0f64; 5];
        for ((value, idx), column) in values.iter_mut().zip(value_idx).zip(OHLCV_COLUMNS) {
            let raw = record.get(idx).unwrap_or_default().trim();
            // Empty cells stay undefined; validation downstream rejects them.
            *value = if raw.is_empty() {
                f64::NAN
            } else {
                raw.parse::<f64>()
                    .map_err(|_| invalid(format!("bad {column} '{raw}'")))?
            };
        }

        rows.push(OhlcvRow {
            timestamp,
            open: values[0],
            high: values[1],
            low: values[2],
            close: values[3],
            volume: values[4],
        });
    }
    Ok(rows)
}

/// Write rows with the standard header.
pub fn write_csv(path: &Path, rows: &[OhlcvRow]) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([TIMESTAMP_COLUMN, "open", "high", "low", "close", "volume"])?;
    for row in rows {
        writer.write_record([
            row.timestamp.to_rfc3339(),
            row.open.to_string(),
            row.high.to_string(),
            row.low.to_string(),
            row.close.to_string(),
            row.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
