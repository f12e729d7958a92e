//! Anomaly alert drafts and the JSONL alert log.
//!
//! Only verdicts from the trained detector raise alerts. Fallback verdicts
//! are informational and never produce a draft. Each logged draft is one
//! JSON object per line, so partial writes lose at most one entry.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentinel_core::domain::{AnomalyResult, ModelStatus};

pub const ANOMALY_CONDITION: &str = "ai_anomaly";

/// A system-generated alert, ready to be persisted by an external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDraft {
    /// Base asset (`BTC` for `BTC-USD`).
    pub cryptocurrency: String,
    pub condition: String,
    pub threshold_value: f64,
    /// Reconstruction error that crossed the threshold.
    pub current_value: f64,
    pub is_triggered: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl AlertDraft {
    /// Draft an alert for a primary-detector anomaly.
    ///
    /// Returns `None` for normal verdicts, failed calls and anything the
    /// fallback detector produced.
    pub fn from_result(result: &AnomalyResult) -> Option<Self> {
        if !result.is_anomaly || result.is_error() || result.model_status != ModelStatus::RealModel {
            return None;
        }
        let error = result.reconstruction_error?;
        Some(Self {
            cryptocurrency: base_asset(&result.symbol).to_string(),
            condition: ANOMALY_CONDITION.to_string(),
            threshold_value: result.threshold,
            current_value: error,
            is_triggered: true,
            message: format!(
                "AI detected market anomaly: Score {:.3} (Error: {:.4})",
                result.anomaly_score, error
            ),
            created_at: result.timestamp,
        })
    }
}

fn base_asset(symbol: &str) -> &str {
    symbol.split('-').next().unwrap_or(symbol)
}

/// Append-only JSONL alert log.
pub struct AlertLog {
    path: PathBuf,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, draft: &AlertDraft) -> io::Result<()> {
        let json = serde_json::to_string(draft)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    /// Read every draft. Malformed lines are skipped.
    pub fn read_all(&self) -> io::Result<Vec<AlertDraft>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut drafts = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AlertDraft>(&line) {
                Ok(draft) => drafts.push(draft),
                Err(e) => debug!(line = i + 1, error = %e, "skipping malformed alert line"),
            }
        }
        Ok(drafts)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
