//! Inference-only LSTM layer using the Keras weight layout.
//!
//! Gate blocks are packed along the last axis in the order input, forget,
//! cell candidate, output:
//!
//! - `kernel`: `[input_dim, 4 * units]`
//! - `recurrent_kernel`: `[units, 4 * units]`
//! - `bias`: `[4 * units]`

use ndarray::{s, Array1, Array2, ArrayView2};

use super::activation::sigmoid;
use super::WeightError;

#[derive(Debug, Clone, PartialEq)]
pub struct LstmLayer {
    units: usize,
    kernel: Array2<f64>,
    recurrent_kernel: Array2<f64>,
    bias: Array1<f64>,
    return_sequences: bool,
}

impl LstmLayer {
    pub fn new(
        kernel: Array2<f64>,
        recurrent_kernel: Array2<f64>,
        bias: Array1<f64>,
        return_sequences: bool,
    ) -> Result<Self, WeightError> {
        let units = recurrent_kernel.nrows();
        if units == 0 {
            return Err(WeightError::Empty { what: "recurrent_kernel" });
        }
        let gates = 4 * units;
        if recurrent_kernel.ncols() != gates {
            return Err(WeightError::Shape {
                what: "recurrent_kernel",
                expected: vec![units, gates],
                actual: recurrent_kernel.shape().to_vec(),
            });
        }
        if kernel.ncols() != gates {
            return Err(WeightError::Shape {
                what: "kernel",
                expected: vec![kernel.nrows(), gates],
                actual: kernel.shape().to_vec(),
            });
        }
        if bias.len() != gates {
            return Err(WeightError::Shape {
                what: "bias",
                expected: vec![gates],
                actual: vec![bias.len()],
            });
        }
        Ok(Self {
            units,
            kernel,
            recurrent_kernel,
            bias,
            return_sequences,
        })
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn input_dim(&self) -> usize {
        self.kernel.nrows()
    }

    pub fn return_sequences(&self) -> bool {
        self.return_sequences
    }

    /// Run the layer over `inputs` (`[steps, input_dim]`) from a zero state.
    ///
    /// Returns every hidden state (`[steps, units]`).
    pub fn hidden_states(&self, inputs: ArrayView2<f64>) -> Array2<f64> {
        let u = self.units;
        let mut h = Array1::<f64>::zeros(u);
        let mut c = Array1::<f64>::zeros(u);
        let mut out = Array2::<f64>::zeros((inputs.nrows(), u));

        for (t, x) in inputs.outer_iter().enumerate() {
            let z = x.dot(&self.kernel) + h.dot(&self.recurrent_kernel) + &self.bias;

            let i_gate = z.slice(s![0..u]).mapv(sigmoid);
            let f_gate = z.slice(s![u..2 * u]).mapv(sigmoid);
            let g = z.slice(s![2 * u..3 * u]).mapv(f64::tanh);
            let o_gate = z.slice(s![3 * u..4 * u]).mapv(sigmoid);

            c = &f_gate * &c + &i_gate * &g;
            h = &o_gate * &c.mapv(f64::tanh);
            out.row_mut(t).assign(&h);
        }
        out
    }

    /// Last hidden state only. Zero vector for an empty input.
    pub fn final_state(&self, inputs: ArrayView2<f64>) -> Array1<f64> {
        let states = self.hidden_states(inputs);
        match states.nrows() {
            0 => Array1::zeros(self.units),
            n => states.row(n - 1).to_owned(),
        }
    }
}
