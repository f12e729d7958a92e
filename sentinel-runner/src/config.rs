//! Runner configuration, read from TOML.
//!
//! Every section and key is optional; a missing file yields the defaults.
//!
//! ```toml
//! [artifacts]
//! dir = "models"
//!
//! [market_data]
//! provider = "csv"
//! data_dir = "data"
//! lookback_days = 60
//! synthetic_fallback = true
//!
//! [alerts]
//! log_path = "alerts.jsonl"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sentinel_core::artifacts::{ArtifactPaths, METADATA_FILE, MODEL_FILE, SCALER_FILE};
use sentinel_core::data::DEFAULT_SYNTHETIC_DAYS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub artifacts: ArtifactConfig,
    pub market_data: MarketDataConfig,
    pub alerts: AlertConfig,
}

/// Where the model artifacts live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub scaler_file: String,
    pub metadata_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            model_file: MODEL_FILE.to_string(),
            scaler_file: SCALER_FILE.to_string(),
            metadata_file: METADATA_FILE.to_string(),
        }
    }
}

impl ArtifactConfig {
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.dir.join(&self.model_file),
            scaler: self.dir.join(&self.scaler_file),
            metadata: self.dir.join(&self.metadata_file),
        }
    }
}

/// Which market data provider to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Csv,
    Parquet,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub provider: ProviderKind,
    /// Directory holding `{SYMBOL}.csv` / `{SYMBOL}.parquet` snapshots.
    pub data_dir: PathBuf,
    pub lookback_days: usize,
    /// Substitute synthetic rows when the provider fails.
    pub synthetic_fallback: bool,
    pub synthetic_seed: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            data_dir: PathBuf::from("data"),
            lookback_days: DEFAULT_SYNTHETIC_DAYS,
            synthetic_fallback: true,
            synthetic_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// JSONL alert log. No log is written when unset.
    pub log_path: Option<PathBuf>,
}

impl SentinelConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market_data.lookback_days == 0 {
            return Err(ConfigError::Invalid(
                "market_data.lookback_days must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(format!("serialize: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = SentinelConfig::from_toml("").unwrap();
        assert_eq!(config, SentinelConfig::default());
        assert_eq!(config.market_data.lookback_days, 60);
        assert!(config.market_data.synthetic_fallback);
        assert_eq!(config.market_data.provider, ProviderKind::Yahoo);
        assert!(config.alerts.log_path.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SentinelConfig::from_toml(
            r#"
            [market_data]
            provider = "parquet"
            lookback_days = 90

            [alerts]
            log_path = "out/alerts.jsonl"
            "#,
        )
        .unwrap();
        assert_eq!(config.market_data.provider, ProviderKind::Parquet);
        assert_eq!(config.market_data.lookback_days, 90);
        assert_eq!(config.market_data.data_dir, PathBuf::from("data"));
        assert_eq!(config.alerts.log_path, Some(PathBuf::from("out/alerts.jsonl")));
        assert_eq!(config.artifacts, ArtifactConfig::default());
    }

    #[test]
    fn artifact_paths_join_dir_and_names() {
        let config = SentinelConfig::from_toml(
            r#"
            [artifacts]
            dir = "/srv/models"
            scaler_file = "scaler_v2.json"
            "#,
        )
        .unwrap();
        let paths = config.artifacts.paths();
        assert_eq!(paths.model, PathBuf::from("/srv/models/lstm_autoencoder.json"));
        assert_eq!(paths.scaler, PathBuf::from("/srv/models/scaler_v2.json"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SentinelConfig::from_file(&dir.path().join("sentinel.toml")).unwrap();
        assert_eq!(config, SentinelConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sentinel.toml");
        std::fs::write(&path, "[market_data\nprovider = 3").unwrap();
        assert!(matches!(
            SentinelConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = SentinelConfig::from_toml("[market_data]\nprovider = \"bloomberg\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_lookback_is_invalid() {
        let err = SentinelConfig::from_toml("[market_data]\nlookback_days = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = SentinelConfig::default();
        config.market_data.provider = ProviderKind::Csv;
        config.alerts.log_path = Some(PathBuf::from("alerts.jsonl"));
        let text = config.to_toml().unwrap();
        assert_eq!(SentinelConfig::from_toml(&text).unwrap(), config);
    }
}
