//! Sentinel Core: feature engineering, windowing, detectors, orchestration.
//!
//! This crate contains the anomaly scoring pipeline:
//! - Domain types (OHLCV rows, anomaly results, model status)
//! - Indicator library and the feature engine
//! - Sequence windowing onto the model's feature list
//! - Model artifacts (frozen LSTM autoencoder, scaler, metadata)
//! - Reconstruction detector and isolation-forest fallback
//! - The orchestrator that routes each call and labels provenance
//! - Market data providers (Yahoo, CSV, Parquet, synthetic)

pub mod artifacts;
pub mod data;
pub mod detector;
pub mod domain;
pub mod features;
pub mod indicators;
pub mod model;
pub mod orchestrator;
pub mod rng;
pub mod window;

pub use artifacts::{load_bundle, ArtifactBundle, ArtifactError, ArtifactPaths};
pub use detector::{Detection, DetectionError, FallbackDetector, FallbackError, ReconstructionDetector};
pub use domain::{normalize_symbol, AnomalyResult, ModelStatus, OhlcvRow};
pub use features::{FeatureEngine, FeatureError, FeatureFrame};
pub use orchestrator::{AnomalyOrchestrator, ModelState, StatusReport};
pub use window::{FeatureWindow, SequenceWindower, WindowError};
