//! Sentinel Runner: configuration, data loading, market checks, alerts.
//!
//! This crate builds on `sentinel-core` to provide:
//! - TOML configuration with per-section defaults
//! - Row loading with provider → synthetic failover
//! - One-shot market checks (load → analyze → alert draft)
//! - JSONL alert log

pub mod alerts;
pub mod check;
pub mod config;
pub mod data_loader;

pub use alerts::{AlertDraft, AlertLog, ANOMALY_CONDITION};
pub use check::{check_rows, run_check, CheckError, CheckReport};
pub use config::{
    AlertConfig, ArtifactConfig, ConfigError, MarketDataConfig, ProviderKind, SentinelConfig,
};
pub use data_loader::{build_provider, load_rows, LoadError, LoadOptions, LoadedRows};
