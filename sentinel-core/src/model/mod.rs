//! Frozen sequence-reconstruction models.
//!
//! Models are inference-only: `reconstruct` takes `&self` and never updates
//! weights, so one loaded model can serve concurrent callers.

pub mod activation;
pub mod lstm;
pub mod sequential;

pub use activation::Activation;
pub use lstm::LstmLayer;
pub use sequential::{DenseLayer, Layer, LayerSpec, ModelSpec, SequentialModel};

use ndarray::Array2;
use std::fmt::Debug;
use thiserror::Error;

/// Runtime failure while scaling or reconstructing a window.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("model expects {expected} features per step, window has {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("reconstruction shape {actual:?} does not match input shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("layer {layer}: {reason}")]
    Layer { layer: usize, reason: String },

    #[error("scaler has no parameters for feature '{feature}'")]
    UnknownScalerFeature { feature: String },

    #[error("scaler has {params} parameters per vector but the window has {features} features")]
    ScalerWidthMismatch { params: usize, features: usize },

    #[error("non-finite value in {stage}")]
    NonFinite { stage: &'static str },
}

/// Malformed or incompatible weights in a model description.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    #[error("model has no layers")]
    NoLayers,

    #[error("{what} is empty")]
    Empty { what: &'static str },

    #[error("{what} has rows of different lengths")]
    Ragged { what: &'static str },

    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    Shape {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("layer {layer}: {reason}")]
    Incompatible { layer: usize, reason: String },
}

/// A frozen model that reproduces a `(sequence_length, feature_count)` sequence.
pub trait ReconstructionModel: Send + Sync + Debug {
    /// Human-readable architecture label.
    fn name(&self) -> &str;

    /// Features per time step the model was trained on, if fixed.
    fn input_features(&self) -> Option<usize>;

    /// Reconstruct one sequence. Output must have the input's shape.
    fn reconstruct(&self, sequence: &Array2<f64>) -> Result<Array2<f64>, InferenceError>;
}
