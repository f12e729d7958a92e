//! Row loading for the runner.
//!
//! Given a symbol and a provider, returns the most recent daily rows.
//! Implements the failover policy:
//! 1. If the provider is available and returns rows → use them
//! 2. If it fails or returns nothing and synthetic fallback is enabled →
//!    generate synthetic rows (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic rows are a development aid. Results scored on them carry the
//! `Synthetic` source so callers can tell.

use thiserror::Error;
use tracing::{info, warn};

use sentinel_core::data::{
    CsvProvider, DataError, DataSource, MarketDataProvider, ParquetProvider, SyntheticProvider,
    YahooProvider,
};
use sentinel_core::domain::OhlcvRow;

use crate::config::{MarketDataConfig, ProviderKind};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("provider '{provider}' is unavailable for '{symbol}' (enable synthetic fallback to continue)")]
    ProviderUnavailable { provider: String, symbol: String },

    #[error("provider '{provider}' returned no rows for '{symbol}'")]
    NoRows { provider: String, symbol: String },

    #[error("failed to load '{symbol}': {source}")]
    Fetch {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling how rows are loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub lookback_days: usize,
    /// Generate synthetic rows when the provider cannot deliver.
    pub synthetic_fallback: bool,
    pub synthetic_seed: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from(&MarketDataConfig::default())
    }
}

impl From<&MarketDataConfig> for LoadOptions {
    fn from(config: &MarketDataConfig) -> Self {
        Self {
            lookback_days: config.lookback_days,
            synthetic_fallback: config.synthetic_fallback,
            synthetic_seed: config.synthetic_seed,
        }
    }
}

/// Rows for one symbol plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedRows {
    pub symbol: String,
    /// Ascending by timestamp.
    pub rows: Vec<OhlcvRow>,
    pub source: DataSource,
    /// BLAKE3 over timestamps and OHLCV values.
    pub dataset_hash: String,
}

impl LoadedRows {
    fn new(symbol: &str, rows: Vec<OhlcvRow>, source: DataSource) -> Self {
        let dataset_hash = compute_dataset_hash(symbol, &rows);
        Self {
            symbol: symbol.to_string(),
            rows,
            source,
            dataset_hash,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }
}

/// Construct the provider named by the config.
pub fn build_provider(config: &MarketDataConfig) -> Result<Box<dyn MarketDataProvider>, LoadError> {
    Ok(match config.provider {
        ProviderKind::Yahoo => Box::new(YahooProvider::new()?),
        ProviderKind::Csv => Box::new(CsvProvider::new(&config.data_dir)),
        ProviderKind::Parquet => Box::new(ParquetProvider::new(&config.data_dir)),
        ProviderKind::Synthetic => Box::new(SyntheticProvider::new(config.synthetic_seed)),
    })
}

/// Load rows for `symbol`, falling back to synthetic rows when allowed.
pub fn load_rows(
    symbol: &str,
    provider: &dyn MarketDataProvider,
    opts: &LoadOptions,
) -> Result<LoadedRows, LoadError> {
    let failure = if !provider.is_available() {
        LoadError::ProviderUnavailable {
            provider: provider.name().to_string(),
            symbol: symbol.to_string(),
        }
    } else {
        match provider.fetch(symbol, opts.lookback_days) {
            Ok(fetched) if !fetched.rows.is_empty() => {
                info!(
                    symbol,
                    provider = provider.name(),
                    rows = fetched.rows.len(),
                    "loaded market data"
                );
                return Ok(LoadedRows::new(symbol, fetched.rows, fetched.source));
            }
            Ok(_) => LoadError::NoRows {
                provider: provider.name().to_string(),
                symbol: symbol.to_string(),
            },
            Err(source) => LoadError::Fetch {
                symbol: symbol.to_string(),
                source,
            },
        }
    };

    if !opts.synthetic_fallback {
        return Err(failure);
    }

    warn!(
        symbol,
        provider = provider.name(),
        error = %failure,
        "falling back to synthetic data; results will be tagged as synthetic"
    );
    let rows = SyntheticProvider::new(opts.synthetic_seed).generate(symbol, opts.lookback_days);
    Ok(LoadedRows::new(symbol, rows, DataSource::Synthetic))
}

fn compute_dataset_hash(symbol: &str, rows: &[OhlcvRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for row in rows {
        hasher.update(&row.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&row.open.to_le_bytes());
        hasher.update(&row.high.to_le_bytes());
        hasher.update(&row.low.to_le_bytes());
        hasher.update(&row.close.to_le_bytes());
        hasher.update(&row.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
