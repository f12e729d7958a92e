//! Sequential layer stack, as exported from a Keras autoencoder.
//!
//! The JSON description is a list of layers applied in order:
//!
//! ```json
//! {
//!   "name": "LSTM Autoencoder",
//!   "layers": [
//!     {"type": "lstm", "kernel": [[...]], "recurrent_kernel": [[...]], "bias": [...], "return_sequences": false},
//!     {"type": "repeat_vector", "n": 30},
//!     {"type": "lstm", "kernel": [[...]], "recurrent_kernel": [[...]], "bias": [...], "return_sequences": true},
//!     {"type": "dropout", "rate": 0.2},
//!     {"type": "dense", "kernel": [[...]], "bias": [...], "activation": "linear"}
//!   ]
//! }
//! ```
//!
//! `dense` on a sequence is applied to every time step.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::activation::Activation;
use super::lstm::LstmLayer;
use super::{InferenceError, ReconstructionModel, WeightError};
use crate::domain::PRIMARY_MODEL_TYPE;

/// One layer as written in the model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Lstm {
        kernel: Vec<Vec<f64>>,
        recurrent_kernel: Vec<Vec<f64>>,
        bias: Vec<f64>,
        #[serde(default)]
        return_sequences: bool,
    },
    RepeatVector {
        n: usize,
    },
    Dense {
        kernel: Vec<Vec<f64>>,
        bias: Vec<f64>,
        #[serde(default)]
        activation: Activation,
    },
    Dropout {
        #[serde(default)]
        rate: f64,
    },
}

/// Whole model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    kernel: Array2<f64>,
    bias: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    pub fn new(
        kernel: Array2<f64>,
        bias: Array1<f64>,
        activation: Activation,
    ) -> Result<Self, WeightError> {
        if bias.len() != kernel.ncols() {
            return Err(WeightError::Shape {
                what: "bias",
                expected: vec![kernel.ncols()],
                actual: vec![bias.len()],
            });
        }
        Ok(Self {
            kernel,
            bias,
            activation,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.kernel.nrows()
    }

    pub fn output_dim(&self) -> usize {
        self.kernel.ncols()
    }
}

/// Runtime layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Lstm(LstmLayer),
    RepeatVector(usize),
    Dense(DenseLayer),
    /// Identity at inference.
    Dropout,
}

/// Value flowing between layers.
enum Tensor {
    Sequence(Array2<f64>),
    Vector(Array1<f64>),
}

/// Static shape used while validating the layer chain.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Sequence(usize),
    Vector(usize),
}

/// A frozen layer stack that maps `[steps, features]` to `[steps, features]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialModel {
    name: String,
    layers: Vec<Layer>,
    input_features: usize,
}

impl SequentialModel {
    /// Build from runtime layers, checking that each layer accepts the
    /// previous one's output and that the stack ends in a sequence as wide
    /// as its input.
    pub fn new(name: impl Into<String>, layers: Vec<Layer>) -> Result<Self, WeightError> {
        let input_features = layers
            .iter()
            .find_map(|layer| match layer {
                Layer::Lstm(lstm) => Some(Ok(lstm.input_dim())),
                Layer::Dense(dense) => Some(Ok(dense.input_dim())),
                Layer::RepeatVector(_) => Some(Err(WeightError::Incompatible {
                    layer: 0,
                    reason: "repeat_vector needs a vector input".into(),
                })),
                Layer::Dropout => None,
            })
            .ok_or(WeightError::NoLayers)??;

        let mut flow = Flow::Sequence(input_features);
        for (idx, layer) in layers.iter().enumerate() {
            flow = next_flow(idx, layer, flow)?;
        }
        if flow != Flow::Sequence(input_features) {
            return Err(WeightError::Incompatible {
                layer: layers.len() - 1,
                reason: format!(
                    "stack ends in {flow:?}, expected a sequence of width {input_features}"
                ),
            });
        }

        Ok(Self {
            name: name.into(),
            layers,
            input_features,
        })
    }

    pub fn from_spec(spec: ModelSpec) -> Result<Self, WeightError> {
        let layers = spec
            .layers
            .into_iter()
            .map(build_layer)
            .collect::<Result<Vec<_>, _>>()?;
        let name = spec.name.unwrap_or_else(|| PRIMARY_MODEL_TYPE.to_string());
        Self::new(name, layers)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl ReconstructionModel for SequentialModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_features(&self) -> Option<usize> {
        Some(self.input_features)
    }

    fn reconstruct(&self, sequence: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        if sequence.ncols() != self.input_features {
            return Err(InferenceError::FeatureCountMismatch {
                expected: self.input_features,
                actual: sequence.ncols(),
            });
        }

        let mut tensor = Tensor::Sequence(sequence.clone());
        for (idx, layer) in self.layers.iter().enumerate() {
            tensor = forward(idx, layer, tensor)?;
        }

        let output = match tensor {
            Tensor::Sequence(seq) => seq,
            Tensor::Vector(_) => {
                return Err(InferenceError::Layer {
                    layer: self.layers.len() - 1,
                    reason: "model produced a vector, not a sequence".into(),
                })
            }
        };

        if output.dim() != sequence.dim() {
            return Err(InferenceError::ShapeMismatch {
                expected: sequence.dim(),
                actual: output.dim(),
            });
        }
        if output.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite {
                stage: "model output",
            });
        }
        Ok(output)
    }
}

fn build_layer(spec: LayerSpec) -> Result<Layer, WeightError> {
    Ok(match spec {
        LayerSpec::Lstm {
            kernel,
            recurrent_kernel,
            bias,
            return_sequences,
        } => Layer::Lstm(LstmLayer::new(
            to_array2(kernel, "kernel")?,
            to_array2(recurrent_kernel, "recurrent_kernel")?,
            Array1::from(bias),
            return_sequences,
        )?),
        LayerSpec::RepeatVector { n } => Layer::RepeatVector(n),
        LayerSpec::Dense {
            kernel,
            bias,
            activation,
        } => Layer::Dense(DenseLayer::new(
            to_array2(kernel, "kernel")?,
            Array1::from(bias),
            activation,
        )?),
        LayerSpec::Dropout { .. } => Layer::Dropout,
    })
}

fn to_array2(rows: Vec<Vec<f64>>, what: &'static str) -> Result<Array2<f64>, WeightError> {
    let nrows = rows.len();
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    if nrows == 0 || ncols == 0 {
        return Err(WeightError::Empty { what });
    }
    if rows.iter().any(|row| row.len() != ncols) {
        return Err(WeightError::Ragged { what });
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|_| WeightError::Ragged { what })
}

fn next_flow(idx: usize, layer: &Layer, flow: Flow) -> Result<Flow, WeightError> {
    let mismatch = |reason: String| WeightError::Incompatible { layer: idx, reason };
    match (layer, flow) {
        (Layer::Lstm(lstm), Flow::Sequence(width)) => {
            if width != lstm.input_dim() {
                return Err(mismatch(format!(
                    "lstm expects width {}, got {width}",
                    lstm.input_dim()
                )));
            }
            Ok(if lstm.return_sequences() {
                Flow::Sequence(lstm.units())
            } else {
                Flow::Vector(lstm.units())
            })
        }
        (Layer::Lstm(_), Flow::Vector(_)) => Err(mismatch("lstm needs a sequence input".into())),
        (Layer::RepeatVector(_), Flow::Vector(width)) => Ok(Flow::Sequence(width)),
        (Layer::RepeatVector(_), Flow::Sequence(_)) => {
            Err(mismatch("repeat_vector needs a vector input".into()))
        }
        (Layer::Dense(dense), Flow::Sequence(width) | Flow::Vector(width)) => {
            if width != dense.input_dim() {
                return Err(mismatch(format!(
                    "dense expects width {}, got {width}",
                    dense.input_dim()
                )));
            }
            Ok(match flow {
                Flow::Sequence(_) => Flow::Sequence(dense.output_dim()),
                Flow::Vector(_) => Flow::Vector(dense.output_dim()),
            })
        }
        (Layer::Dropout, flow) => Ok(flow),
    }
}

fn forward(idx: usize, layer: &Layer, tensor: Tensor) -> Result<Tensor, InferenceError> {
    let unexpected = |reason: &str| InferenceError::Layer {
        layer: idx,
        reason: reason.to_string(),
    };
    match (layer, tensor) {
        (Layer::Lstm(lstm), Tensor::Sequence(seq)) => Ok(if lstm.return_sequences() {
            Tensor::Sequence(lstm.hidden_states(seq.view()))
        } else {
            Tensor::Vector(lstm.final_state(seq.view()))
        }),
        (Layer::Lstm(_), Tensor::Vector(_)) => Err(unexpected("lstm needs a sequence input")),
        (Layer::RepeatVector(n), Tensor::Vector(v)) => {
            let width = v.len();
            let repeated = v
                .broadcast((*n, width))
                .map(|view| view.to_owned())
                .ok_or_else(|| unexpected("cannot repeat vector"))?;
            Ok(Tensor::Sequence(repeated))
        }
        (Layer::RepeatVector(_), Tensor::Sequence(_)) => {
            Err(unexpected("repeat_vector needs a vector input"))
        }
        (Layer::Dense(dense), Tensor::Sequence(seq)) => Ok(Tensor::Sequence(
            dense.activation.apply(seq.dot(&dense.kernel) + &dense.bias),
        )),
        (Layer::Dense(dense), Tensor::Vector(v)) => Ok(Tensor::Vector(
            dense.activation.apply(v.dot(&dense.kernel) + &dense.bias),
        )),
        (Layer::Dropout, tensor) => Ok(tensor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn zeros(r: usize, c: usize) -> Vec<Vec<f64>> {
        vec![vec![0.0; c]; r]
    }

    /// features -> lstm(units, no sequences) -> repeat(n) -> lstm(units) -> dense(features)
    fn autoencoder_spec(features: usize, units: usize, n: usize) -> ModelSpec {
        ModelSpec {
            name: None,
            layers: vec![
                LayerSpec::Lstm {
                    kernel: zeros(features, 4 * units),
                    recurrent_kernel: zeros(units, 4 * units),
                    bias: vec![0.0; 4 * units],
                    return_sequences: false,
                },
                LayerSpec::RepeatVector { n },
                LayerSpec::Lstm {
                    kernel: zeros(units, 4 * units),
                    recurrent_kernel: zeros(units, 4 * units),
                    bias: vec![0.0; 4 * units],
                    return_sequences: true,
                },
                LayerSpec::Dropout { rate: 0.2 },
                LayerSpec::Dense {
                    kernel: zeros(units, features),
                    bias: vec![0.5; features],
                    activation: Activation::Linear,
                },
            ],
        }
    }

    #[test]
    fn autoencoder_output_matches_input_shape() {
        let model = SequentialModel::from_spec(autoencoder_spec(3, 4, 10)).unwrap();
        assert_eq!(model.input_features(), Some(3));
        assert_eq!(model.name(), PRIMARY_MODEL_TYPE);
        let out = model.reconstruct(&Array::from_elem((10, 3), 2.0)).unwrap();
        assert_eq!(out.dim(), (10, 3));
        // Zero weights leave only the dense bias.
        assert!(out.iter().all(|v| (*v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let model = SequentialModel::from_spec(autoencoder_spec(3, 4, 10)).unwrap();
        let err = model.reconstruct(&Array::zeros((10, 2))).unwrap_err();
        assert_eq!(
            err,
            InferenceError::FeatureCountMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn repeat_length_must_match_window() {
        let model = SequentialModel::from_spec(autoencoder_spec(3, 4, 10)).unwrap();
        let err = model.reconstruct(&Array::zeros((12, 3))).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { .. }));
    }

    #[test]
    fn stack_must_end_at_input_width() {
        let mut spec = autoencoder_spec(3, 4, 10);
        spec.layers.pop();
        spec.layers.push(LayerSpec::Dense {
            kernel: zeros(4, 2),
            bias: vec![0.0; 2],
            activation: Activation::Linear,
        });
        assert!(matches!(
            SequentialModel::from_spec(spec),
            Err(WeightError::Incompatible { layer: 4, .. })
        ));
    }

    #[test]
    fn ragged_kernel_is_rejected() {
        let mut spec = autoencoder_spec(2, 1, 5);
        spec.layers[0] = LayerSpec::Lstm {
            kernel: vec![vec![0.0; 4], vec![0.0; 3]],
            recurrent_kernel: zeros(1, 4),
            bias: vec![0.0; 4],
            return_sequences: false,
        };
        assert_eq!(
            SequentialModel::from_spec(spec).unwrap_err(),
            WeightError::Ragged { what: "kernel" }
        );
    }

    #[test]
    fn empty_stack_is_rejected() {
        let spec = ModelSpec {
            name: None,
            layers: vec![LayerSpec::Dropout { rate: 0.1 }],
        };
        assert_eq!(
            SequentialModel::from_spec(spec).unwrap_err(),
            WeightError::NoLayers
        );
    }

    #[test]
    fn parses_layer_tags_from_json() {
        let json = r#"{
            "layers": [
                {"type": "dense", "kernel": [[1.0, 0.0], [0.0, 1.0]], "bias": [0.0, 0.0]},
                {"type": "dropout"}
            ]
        }"#;
        let spec: ModelSpec = serde_json::from_str(json).unwrap();
        let model = SequentialModel::from_spec(spec).unwrap();
        let input = Array::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(model.reconstruct(&input).unwrap(), input);
    }
}
