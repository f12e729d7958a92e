//! Sequence windowing: project a feature frame onto the model's feature list
//! and take the trailing `sequence_length` rows.

use ndarray::Array2;
use thiserror::Error;

use crate::features::FeatureFrame;

/// Structural failures while building the model window.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("no matching features found. Available: {available:?}, Expected: {expected:?}")]
    NoMatchingFeatures {
        available: Vec<String>,
        expected: Vec<String>,
    },

    #[error("need at least {required} data points, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
}

/// The raw (unscaled) trailing window, ready for scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    /// Selected feature names, in the model's expected order.
    pub feature_names: Vec<String>,
    /// `sequence_length × feature_names.len()` matrix, oldest row first.
    pub values: Array2<f64>,
}

impl FeatureWindow {
    pub fn sequence_length(&self) -> usize {
        self.values.nrows()
    }

    pub fn feature_count(&self) -> usize {
        self.values.ncols()
    }
}

/// Selects and validates the window one inference needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceWindower {
    expected: Vec<String>,
    sequence_length: usize,
}

impl SequenceWindower {
    pub fn new(expected: Vec<String>, sequence_length: usize) -> Self {
        Self {
            expected,
            sequence_length,
        }
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Expected ∩ available feature names, in expected order.
    pub fn select(&self, frame: &FeatureFrame) -> Vec<String> {
        self.expected
            .iter()
            .filter(|name| frame.contains(name))
            .cloned()
            .collect()
    }

    /// Build the window. Does not mutate `frame`.
    pub fn window(&self, frame: &FeatureFrame) -> Result<FeatureWindow, WindowError> {
        let selected = self.select(frame);
        if selected.is_empty() {
            return Err(WindowError::NoMatchingFeatures {
                available: frame.names().to_vec(),
                expected: self.expected.clone(),
            });
        }

        let rows = frame.len();
        if rows < self.sequence_length {
            return Err(WindowError::InsufficientHistory {
                required: self.sequence_length,
                actual: rows,
            });
        }

        let start = rows - self.sequence_length;
        let columns: Vec<&[f64]> = selected
            .iter()
            .filter_map(|name| frame.column(name))
            .collect();
        let values = Array2::from_shape_fn((self.sequence_length, columns.len()), |(i, j)| {
            columns[j][start + i]
        });

        Ok(FeatureWindow {
            feature_names: selected,
            values,
        })
    }
}
