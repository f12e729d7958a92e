//! Fitted feature scaler, applied with `transform` only.
//!
//! Parameters are stored per feature, keyed by the training feature order.
//! When the window carries only a subset of those features the scaler is
//! projected onto that subset by name.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::model::InferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// `(x - mean) / scale`. A zero scale is treated as 1 (constant feature).
    Standard {
        #[serde(default)]
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// `x * scale + min`.
    MinMax {
        #[serde(default)]
        feature_names: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl FeatureScaler {
    /// Feature names the scaler was fitted on. Empty if the scaler is positional.
    pub fn feature_names(&self) -> &[String] {
        match self {
            FeatureScaler::Standard { feature_names, .. }
            | FeatureScaler::MinMax { feature_names, .. } => feature_names,
        }
    }

    fn params(&self) -> (&[f64], &[f64]) {
        match self {
            FeatureScaler::Standard { mean, scale, .. } => (mean, scale),
            FeatureScaler::MinMax { min, scale, .. } => (min, scale),
        }
    }

    pub fn width(&self) -> usize {
        self.params().0.len()
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        let (offset, scale) = self.params();
        let invalid = |reason: String| ArtifactError::InvalidScaler { reason };
        if offset.is_empty() {
            return Err(invalid("scaler has no parameters".into()));
        }
        if offset.len() != scale.len() {
            return Err(invalid(format!(
                "parameter vectors differ in length ({} vs {})",
                offset.len(),
                scale.len()
            )));
        }
        let names = self.feature_names();
        if !names.is_empty() && names.len() != offset.len() {
            return Err(invalid(format!(
                "{} feature names for {} parameters",
                names.len(),
                offset.len()
            )));
        }
        if offset.iter().chain(scale).any(|v| !v.is_finite()) {
            return Err(invalid("non-finite scaler parameter".into()));
        }
        Ok(())
    }

    /// Parameter index for each window column.
    fn columns(&self, names: &[String]) -> Result<Vec<usize>, InferenceError> {
        let known = self.feature_names();
        if known.is_empty() {
            if names.len() != self.width() {
                return Err(InferenceError::ScalerWidthMismatch {
                    params: self.width(),
                    features: names.len(),
                });
            }
            return Ok((0..names.len()).collect());
        }
        names
            .iter()
            .map(|name| {
                known
                    .iter()
                    .position(|k| k == name)
                    .ok_or_else(|| InferenceError::UnknownScalerFeature {
                        feature: name.clone(),
                    })
            })
            .collect()
    }

    /// Scale `values`, whose columns are `names`.
    pub fn transform(
        &self,
        names: &[String],
        values: &Array2<f64>,
    ) -> Result<Array2<f64>, InferenceError> {
        if names.len() != values.ncols() {
            return Err(InferenceError::ScalerWidthMismatch {
                params: names.len(),
                features: values.ncols(),
            });
        }
        let columns = self.columns(names)?;
        let (offset, scale) = self.params();

        let mut scaled = values.clone();
        for (j, mut column) in scaled.columns_mut().into_iter().enumerate() {
            let k = columns[j];
            match self {
                FeatureScaler::Standard { .. } => {
                    let s = if scale[k] == 0.0 { 1.0 } else { scale[k] };
                    column.mapv_inplace(|x| (x - offset[k]) / s);
                }
                FeatureScaler::MinMax { .. } => {
                    column.mapv_inplace(|x| x * scale[k] + offset[k]);
                }
            }
        }

        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite {
                stage: "scaled window",
            });
        }
        Ok(scaled)
    }
}
