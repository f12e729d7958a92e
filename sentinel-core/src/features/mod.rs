//! Feature engineering for anomaly detection

pub mod engine;
pub mod frame;

pub use engine::{feature_columns, validate_rows, FeatureConfig, FeatureEngine, FeatureError};
pub use frame::FeatureFrame;
