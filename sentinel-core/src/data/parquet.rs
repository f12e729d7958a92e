//! Parquet snapshots: one `{SYMBOL}.parquet` file per symbol.
//!
//! Columns: `timestamp` (Datetime or Date), `open`, `high`, `low`, `close`,
//! `volume`. Numeric columns of any integer or float type are read as f64.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use polars::prelude::*;

use super::provider::{finalize_rows, DataError, DataSource, FetchResult, MarketDataProvider};
use crate::domain::{OhlcvRow, OHLCV_COLUMNS};

pub struct ParquetProvider {
    dir: PathBuf,
}

impl ParquetProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.parquet"))
    }
}

impl MarketDataProvider for ParquetProvider {
    fn name(&self) -> &str {
        "parquet_import"
    }

    fn fetch(&self, symbol: &str, lookback_days: usize) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::NoDataFile {
                symbol: symbol.to_string(),
                path: path.display().to_string(),
            });
        }
        let rows = read_parquet(&path)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            rows: finalize_rows(rows, lookback_days),
            source: DataSource::ParquetImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

/// Convert rows to a DataFrame with a millisecond UTC timestamp column.
fn rows_to_dataframe(rows: &[OhlcvRow]) -> Result<DataFrame, DataError> {
    let millis: Vec<i64> = rows.iter().map(|r| r.timestamp.timestamp_millis()).collect();
    let column = |name: &str, f: fn(&OhlcvRow) -> f64| {
        Column::new(name.into(), rows.iter().map(f).collect::<Vec<f64>>())
    };

    DataFrame::new(vec![
        Column::new("timestamp".into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .map_err(|e| DataError::ParquetError(format!("timestamp cast: {e}")))?,
        column("open", |r| r.open),
        column("high", |r| r.high),
        column("low", |r| r.low),
        column("close", |r| r.close),
        column("volume", |r| r.volume),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

pub fn write_parquet(path: &Path, rows: &[OhlcvRow]) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut df = rows_to_dataframe(rows)?;
    let file = fs::File::create(path)?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<Vec<OhlcvRow>, DataError> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;
    let path_str = path.display().to_string();

    let column = |name: &str| {
        df.column(name).map_err(|_| DataError::MissingColumn {
            column: name.to_string(),
            path: path_str.clone(),
        })
    };

    let ts = column("timestamp")?
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .and_then(|c| c.cast(&DataType::Int64))
        .map_err(|e| DataError::ParquetError(format!("timestamp column type: {e}")))?;
    let ts = ts
        .i64()
        .map_err(|e| DataError::ParquetError(format!("timestamp column type: {e}")))?;

    let mut values = Vec::with_capacity(OHLCV_COLUMNS.len());
    for name in OHLCV_COLUMNS {
        let col = column(name)?
            .cast(&DataType::Float64)
            .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))?;
        let ca = col
            .f64()
            .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))?
            .clone();
        values.push(ca);
    }

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let millis = ts
            .get(i)
            .ok_or_else(|| DataError::InvalidRow {
                path: path_str.clone(),
                row: i,
                reason: "null timestamp".into(),
            })?;
        let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            DataError::InvalidRow {
                path: path_str.clone(),
                row: i,
                reason: format!("timestamp out of range: {millis}"),
            }
        })?;
        let v = |k: usize| values[k].get(i).unwrap_or(f64::NAN);
        rows.push(OhlcvRow {
            timestamp,
            open: v(0),
            high: v(1),
            low: v(2),
            close: v(3),
            volume: v(4),
        });
    }
    Ok(rows)
}
