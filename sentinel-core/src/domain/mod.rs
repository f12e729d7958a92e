//! Domain types for the anomaly pipeline

pub mod ohlcv;
pub mod result;

pub use ohlcv::{is_ascending, OhlcvRow, OHLCV_COLUMNS};
pub use result::{
    AnomalyResult, ModelStatus, ERROR_MODEL_TYPE, FALLBACK_FAILED_MODEL_TYPE,
    FALLBACK_MODEL_TYPE, PRIMARY_MODEL_TYPE,
};

/// Symbol type alias
pub type Symbol = String;

/// Normalize a bare ticker to a quote pair (`BTC` → `BTC-USD`).
///
/// Symbols that already name a pair are returned unchanged.
pub fn normalize_symbol(symbol: &str) -> Symbol {
    let trimmed = symbol.trim().to_uppercase();
    if trimmed.contains('-') {
        trimmed
    } else {
        format!("{trimmed}-USD")
    }
}
