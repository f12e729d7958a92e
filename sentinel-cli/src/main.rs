//! Sentinel CLI: score market data for anomalies.
//!
//! Commands:
//! - `analyze`: load recent daily rows for a symbol and print the verdict as JSON
//! - `status`: report whether the trained model is loaded
//! - `synth`: write a synthetic BTC-like series to CSV or Parquet

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sentinel_core::data::{write_csv, write_parquet, SyntheticProvider};
use sentinel_core::domain::normalize_symbol;
use sentinel_core::AnomalyOrchestrator;
use sentinel_runner::{
    build_provider, run_check, AlertLog, LoadOptions, ProviderKind, SentinelConfig,
};

#[derive(Parser)]
#[command(
    name = "sentinel",
    about = "Sentinel CLI: crypto market anomaly scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Config file and artifact overrides shared by `analyze` and `status`.
#[derive(Args)]
struct CommonArgs {
    /// Path to a TOML config file. Missing file means defaults.
    #[arg(long, default_value = "sentinel.toml")]
    config: PathBuf,

    /// Directory holding the model artifacts (overrides the config).
    #[arg(long)]
    models: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load recent daily rows for a symbol and score them.
    Analyze {
        /// Symbol (e.g., BTC, BTC-USD, ETH-USD).
        #[arg(default_value = "BTC-USD")]
        symbol: String,

        #[command(flatten)]
        common: CommonArgs,

        /// Read `{SYMBOL}.csv` from this directory.
        #[arg(long, conflicts_with_all = ["parquet", "yahoo"])]
        csv: Option<PathBuf>,

        /// Read `{SYMBOL}.parquet` from this directory.
        #[arg(long, conflicts_with = "yahoo")]
        parquet: Option<PathBuf>,

        /// Fetch from Yahoo Finance.
        #[arg(long, default_value_t = false)]
        yahoo: bool,

        /// Use synthetic data when the provider fails.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Append primary-model anomaly alerts to this JSONL file.
        #[arg(long)]
        alerts_log: Option<PathBuf>,

        /// Number of daily rows to request.
        #[arg(long)]
        lookback_days: Option<usize>,
    },
    /// Report whether the trained model is loaded.
    Status {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Write a synthetic BTC-like daily series.
    Synth {
        #[arg(long, default_value = "BTC-USD")]
        symbol: String,

        #[arg(long, default_value_t = 60)]
        days: usize,

        /// Output file; `.parquet` writes Parquet, anything else CSV.
        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbol,
            common,
            csv,
            parquet,
            yahoo,
            synthetic,
            alerts_log,
            lookback_days,
        } => {
            let mut config = load_config(&common)?;
            let market = &mut config.market_data;
            if let Some(dir) = csv {
                market.provider = ProviderKind::Csv;
                market.data_dir = dir;
            } else if let Some(dir) = parquet {
                market.provider = ProviderKind::Parquet;
                market.data_dir = dir;
            } else if yahoo {
                market.provider = ProviderKind::Yahoo;
            }
            if synthetic {
                market.synthetic_fallback = true;
            }
            if let Some(days) = lookback_days {
                market.lookback_days = days;
            }
            if alerts_log.is_some() {
                config.alerts.log_path = alerts_log;
            }
            config.validate()?;
            run_analyze(&symbol, &config)
        }
        Commands::Status { common } => run_status(&load_config(&common)?),
        Commands::Synth {
            symbol,
            days,
            out,
            seed,
        } => run_synth(&symbol, days, &out, seed),
    }
}

fn load_config(common: &CommonArgs) -> Result<SentinelConfig> {
    let mut config = SentinelConfig::from_file(&common.config)
        .with_context(|| format!("loading {}", common.config.display()))?;
    if let Some(dir) = &common.models {
        config.artifacts.dir = dir.clone();
    }
    Ok(config)
}

fn run_analyze(symbol: &str, config: &SentinelConfig) -> Result<()> {
    let orchestrator = AnomalyOrchestrator::initialize(&config.artifacts.paths());
    let provider = build_provider(&config.market_data)?;
    let alert_log = config.alerts.log_path.clone().map(AlertLog::new);

    let report = run_check(
        symbol,
        &orchestrator,
        provider.as_ref(),
        &LoadOptions::from(&config.market_data),
        alert_log.as_ref(),
    )?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_status(config: &SentinelConfig) -> Result<()> {
    let orchestrator = AnomalyOrchestrator::initialize(&config.artifacts.paths());
    println!("{}", serde_json::to_string_pretty(&orchestrator.status())?);
    Ok(())
}

fn run_synth(symbol: &str, days: usize, out: &Path, seed: u64) -> Result<()> {
    if days == 0 {
        bail!("--days must be positive");
    }
    let symbol = normalize_symbol(symbol);
    let rows = SyntheticProvider::new(seed).generate(&symbol, days);

    let is_parquet = out
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(out, &rows)?;
    } else {
        write_csv(out, &rows)?;
    }

    tracing::info!(symbol = %symbol, rows = rows.len(), path = %out.display(), "wrote synthetic series");
    Ok(())
}
