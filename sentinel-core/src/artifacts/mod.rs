//! Model artifact bundle: frozen model, fitted scaler, and metadata.
//!
//! The bundle is loaded once by [`load_bundle`], a pure function of the three
//! file paths. Any missing or malformed file fails the whole load.

pub mod metadata;
pub mod scaler;

pub use metadata::{ModelMetadata, DEFAULT_SEQUENCE_LENGTH, DEFAULT_THRESHOLD};
pub use scaler::FeatureScaler;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use crate::model::{ModelSpec, ReconstructionModel, SequentialModel, WeightError};

pub const MODEL_FILE: &str = "lstm_autoencoder.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const METADATA_FILE: &str = "model_metadata.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model in {}: {source}", path.display())]
    InvalidModel {
        path: PathBuf,
        #[source]
        source: WeightError,
    },

    #[error("invalid scaler: {reason}")]
    InvalidScaler { reason: String },

    #[error("invalid metadata: {reason}")]
    InvalidMetadata { reason: String },
}

impl ArtifactError {
    /// Path of the offending file, when the failure is tied to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ArtifactError::Missing { path }
            | ArtifactError::Io { path, .. }
            | ArtifactError::Parse { path, .. }
            | ArtifactError::InvalidModel { path, .. } => Some(path),
            ArtifactError::InvalidScaler { .. } | ArtifactError::InvalidMetadata { .. } => None,
        }
    }
}

/// Locations of the three artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            scaler: dir.join(SCALER_FILE),
            metadata: dir.join(METADATA_FILE),
        }
    }
}

/// Immutable, loaded artifacts. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub model: Arc<dyn ReconstructionModel>,
    pub scaler: FeatureScaler,
    pub metadata: ModelMetadata,
    /// BLAKE3 hex digest identifying this artifact set.
    pub fingerprint: String,
}

impl ArtifactBundle {
    /// Assemble a bundle from in-memory parts.
    ///
    /// An empty metadata feature list is taken from the scaler. The fingerprint
    /// covers the model name, scaler, and metadata.
    pub fn from_parts(
        model: Arc<dyn ReconstructionModel>,
        scaler: FeatureScaler,
        mut metadata: ModelMetadata,
    ) -> Result<Self, ArtifactError> {
        scaler.validate()?;
        metadata.validate()?;
        if metadata.feature_names.is_empty() {
            metadata.feature_names = scaler.feature_names().to_vec();
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(model.name().as_bytes());
        hasher.update(&serde_json::to_vec(&scaler).unwrap_or_default());
        hasher.update(&serde_json::to_vec(&metadata).unwrap_or_default());
        let fingerprint = hasher.finalize().to_hex().to_string();

        Ok(Self {
            model,
            scaler,
            metadata,
            fingerprint,
        })
    }
}

/// Load and validate the artifact bundle.
///
/// The fingerprint is a BLAKE3 hash over the raw bytes of the three files,
/// in model, scaler, metadata order.
pub fn load_bundle(paths: &ArtifactPaths) -> Result<ArtifactBundle, ArtifactError> {
    let model_bytes = read_artifact(&paths.model)?;
    let scaler_bytes = read_artifact(&paths.scaler)?;
    let metadata_bytes = read_artifact(&paths.metadata)?;

    let spec: ModelSpec = parse(&paths.model, &model_bytes)?;
    let model = SequentialModel::from_spec(spec).map_err(|source| ArtifactError::InvalidModel {
        path: paths.model.clone(),
        source,
    })?;
    let scaler: FeatureScaler = parse(&paths.scaler, &scaler_bytes)?;
    let metadata: ModelMetadata = parse(&paths.metadata, &metadata_bytes)?;

    let mut bundle = ArtifactBundle::from_parts(Arc::new(model), scaler, metadata)?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(&model_bytes);
    hasher.update(&scaler_bytes);
    hasher.update(&metadata_bytes);
    bundle.fingerprint = hasher.finalize().to_hex().to_string();

    info!(
        model = %paths.model.display(),
        sequence_length = bundle.metadata.sequence_length,
        threshold = bundle.metadata.threshold,
        features = bundle.metadata.feature_names.len(),
        fingerprint = %&bundle.fingerprint[..12],
        "loaded model artifacts"
    );
    Ok(bundle)
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ArtifactError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn parse<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_artifacts(dir: &Path, threshold: f64) {
        let model = json!({
            "layers": [
                {"type": "dense", "kernel": [[1.0, 0.0], [0.0, 1.0]], "bias": [0.0, 0.0]}
            ]
        });
        let scaler = json!({
            "kind": "standard",
            "feature_names": ["price_change", "volatility"],
            "mean": [0.0, 0.0],
            "scale": [1.0, 1.0]
        });
        let metadata = json!({"threshold": threshold});
        fs::write(dir.join(MODEL_FILE), model.to_string()).unwrap();
        fs::write(dir.join(SCALER_FILE), scaler.to_string()).unwrap();
        fs::write(dir.join(METADATA_FILE), metadata.to_string()).unwrap();
    }

    #[test]
    fn loads_complete_bundle() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path(), 0.2);
        let bundle = load_bundle(&ArtifactPaths::in_dir(dir.path())).unwrap();
        assert_eq!(bundle.metadata.sequence_length, DEFAULT_SEQUENCE_LENGTH);
        assert_eq!(bundle.metadata.threshold, 0.2);
        // Feature order falls back to the scaler's.
        assert_eq!(
            bundle.metadata.feature_names,
            vec!["price_change".to_string(), "volatility".to_string()]
        );
        assert_eq!(bundle.model.input_features(), Some(2));
        assert_eq!(bundle.fingerprint.len(), 64);
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write_artifacts(a.path(), 0.2);
        write_artifacts(b.path(), 0.3);
        let first = load_bundle(&ArtifactPaths::in_dir(a.path())).unwrap();
        let again = load_bundle(&ArtifactPaths::in_dir(a.path())).unwrap();
        let other = load_bundle(&ArtifactPaths::in_dir(b.path())).unwrap();
        assert_eq!(first.fingerprint, again.fingerprint);
        assert_ne!(first.fingerprint, other.fingerprint);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path(), 0.2);
        fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
        let err = load_bundle(&ArtifactPaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
        assert_eq!(err.path(), Some(dir.path().join(SCALER_FILE).as_path()));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path(), 0.2);
        fs::write(dir.path().join(METADATA_FILE), "{not json").unwrap();
        let err = load_bundle(&ArtifactPaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }

    #[test]
    fn invalid_threshold_fails_load() {
        let dir = TempDir::new().unwrap();
        write_artifacts(dir.path(), -1.0);
        let err = load_bundle(&ArtifactPaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidMetadata { .. }));
    }
}
