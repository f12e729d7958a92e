//! Market data: provider trait plus Yahoo, CSV, Parquet, and synthetic sources.

pub mod csv_import;
pub mod parquet;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_import::{read_csv, write_csv, CsvProvider};
pub use parquet::{read_parquet, write_parquet, ParquetProvider};
pub use provider::{finalize_rows, DataError, DataSource, FetchResult, MarketDataProvider};
pub use synthetic::{SyntheticProvider, DEFAULT_SYNTHETIC_DAYS};
pub use yahoo::YahooProvider;
