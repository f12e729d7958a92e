//! Model metadata: window length, decision threshold, training feature order.

use serde::{Deserialize, Serialize};

use super::ArtifactError;

pub const DEFAULT_SEQUENCE_LENGTH: usize = 30;
pub const DEFAULT_THRESHOLD: f64 = 0.1;

fn default_sequence_length() -> usize {
    DEFAULT_SEQUENCE_LENGTH
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub feature_names: Vec<String>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            threshold: DEFAULT_THRESHOLD,
            feature_names: Vec::new(),
        }
    }
}

impl ModelMetadata {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.sequence_length == 0 {
            return Err(ArtifactError::InvalidMetadata {
                reason: "sequence_length must be positive".into(),
            });
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(ArtifactError::InvalidMetadata {
                reason: format!("threshold must be positive, got {}", self.threshold),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let meta: ModelMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, ModelMetadata::default());
        assert_eq!(meta.sequence_length, 30);
        assert_eq!(meta.threshold, 0.1);
        assert!(meta.feature_names.is_empty());
    }

    #[test]
    fn explicit_values_are_kept() {
        let meta: ModelMetadata = serde_json::from_str(
            r#"{"sequence_length": 20, "threshold": 0.25, "feature_names": ["rsi"]}"#,
        )
        .unwrap();
        assert_eq!(meta.sequence_length, 20);
        assert_eq!(meta.threshold, 0.25);
        assert_eq!(meta.feature_names, vec!["rsi".to_string()]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let meta: ModelMetadata =
            serde_json::from_str(r#"{"trained_at": "2024-01-01", "epochs": 50}"#).unwrap();
        assert_eq!(meta, ModelMetadata::default());
    }

    #[test]
    fn non_positive_threshold_is_invalid() {
        let meta = ModelMetadata {
            threshold: 0.0,
            ..ModelMetadata::default()
        };
        assert!(meta.validate().is_err());
    }

    #[test]
    fn zero_sequence_length_is_invalid() {
        let meta = ModelMetadata {
            sequence_length: 0,
            ..ModelMetadata::default()
        };
        assert!(meta.validate().is_err());
    }
}
