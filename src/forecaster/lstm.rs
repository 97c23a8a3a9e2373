//! LSTM layer with flat weight storage.
//!
//! Gate layout follows the Keras convention so trained checkpoints export
//! without reshuffling:
//!
//! ```text
//! z   = x·W + h·U + b           (W: [in × 4u], U: [u × 4u], b: [4u])
//! i   = σ(z[0..u])               input gate
//! f   = σ(z[u..2u])              forget gate
//! c̃   = tanh(z[2u..3u])          candidate
//! o   = σ(z[3u..4u])             output gate
//! c'  = f⊙c + i⊙c̃
//! h'  = o⊙tanh(c')
//! ```

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot/Xavier uniform sample: U(−limit, limit), limit = √(6 / (fan_in + fan_out)).
pub(crate) fn glorot_uniform(len: usize, fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
    (0..len).map(|_| rng.gen_range(-limit..=limit)).collect()
}

/// Inverted-dropout mask: kept entries are scaled by 1/(1−rate).
pub(crate) fn dropout_mask(len: usize, rate: f64, rng: &mut StdRng) -> Vec<f64> {
    let keep = 1.0 - rate;
    (0..len)
        .map(|_| if rng.gen::<f64>() < rate { 0.0 } else { 1.0 / keep })
        .collect()
}

/// Input and recurrent dropout masks, fixed for the whole sequence.
#[derive(Debug, Clone)]
pub struct LstmDropout {
    pub input: Vec<f64>,
    pub recurrent: Vec<f64>,
}

impl LstmDropout {
    pub fn sample(input_size: usize, units: usize, input_rate: f64, recurrent_rate: f64, rng: &mut StdRng) -> Self {
        Self {
            input: dropout_mask(input_size, input_rate, rng),
            recurrent: dropout_mask(units, recurrent_rate, rng),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmLayer {
    pub input_size: usize,
    pub units: usize,
    /// [input_size × 4·units], row-major
    pub kernel: Vec<f64>,
    /// [units × 4·units], row-major
    pub recurrent_kernel: Vec<f64>,
    /// [4·units]
    pub bias: Vec<f64>,
}

impl LstmLayer {
    /// Glorot-uniform kernels, zero bias with the forget gate biased to 1.
    pub fn glorot(input_size: usize, units: usize, rng: &mut StdRng) -> Self {
        let gates = 4 * units;
        let kernel = glorot_uniform(input_size * gates, input_size, gates, rng);
        let recurrent_kernel = glorot_uniform(units * gates, units, gates, rng);
        let mut bias = vec![0.0; gates];
        for b in &mut bias[units..2 * units] {
            *b = 1.0;
        }
        Self { input_size, units, kernel, recurrent_kernel, bias }
    }

    pub fn num_params(&self) -> usize {
        self.kernel.len() + self.recurrent_kernel.len() + self.bias.len()
    }

    /// Check stored tensor lengths against the declared shape.
    pub fn shape_errors(&self, name: &str, input_size: usize, units: usize) -> Vec<String> {
        let gates = 4 * units;
        let mut errors = Vec::new();
        if self.input_size != input_size || self.units != units {
            errors.push(format!(
                "{name}: expected {input_size}→{units}, found {}→{}",
                self.input_size, self.units
            ));
        }
        for (part, found, expected) in [
            ("kernel", self.kernel.len(), input_size * gates),
            ("recurrent_kernel", self.recurrent_kernel.len(), units * gates),
            ("bias", self.bias.len(), gates),
        ] {
            if found != expected {
                errors.push(format!("{name}.{part}: expected {expected} values, found {found}"));
            }
        }
        errors
    }

    /// Run the full sequence, returning the hidden state after every step.
    pub fn forward_sequence(&self, inputs: &[Vec<f64>], dropout: Option<&LstmDropout>) -> Vec<Vec<f64>> {
        let u = self.units;
        let gates = 4 * u;
        let mut h = vec![0.0; u];
        let mut c = vec![0.0; u];
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut z = vec![0.0; gates];

        for x in inputs {
            z.copy_from_slice(&self.bias);

            for (i, &xi) in x.iter().enumerate().take(self.input_size) {
                let xi = dropout.map_or(xi, |d| xi * d.input[i]);
                if xi == 0.0 {
                    continue;
                }
                let row = &self.kernel[i * gates..(i + 1) * gates];
                for (zj, w) in z.iter_mut().zip(row) {
                    *zj += xi * w;
                }
            }

            for (k, &hk) in h.iter().enumerate() {
                let hk = dropout.map_or(hk, |d| hk * d.recurrent[k]);
                if hk == 0.0 {
                    continue;
                }
                let row = &self.recurrent_kernel[k * gates..(k + 1) * gates];
                for (zj, w) in z.iter_mut().zip(row) {
                    *zj += hk * w;
                }
            }

            for j in 0..u {
                let i_gate = sigmoid(z[j]);
                let f_gate = sigmoid(z[u + j]);
                let candidate = z[2 * u + j].tanh();
                let o_gate = sigmoid(z[3 * u + j]);
                c[j] = f_gate * c[j] + i_gate * candidate;
                h[j] = o_gate * c[j].tanh();
            }
            outputs.push(h.clone());
        }
        outputs
    }

    /// Final hidden state only.
    pub fn forward_last(&self, inputs: &[Vec<f64>], dropout: Option<&LstmDropout>) -> Vec<f64> {
        self.forward_sequence(inputs, dropout)
            .pop()
            .unwrap_or_else(|| vec![0.0; self.units])
    }
}

/// Fully connected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub input_size: usize,
    pub units: usize,
    /// [input_size × units], row-major
    pub kernel: Vec<f64>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    pub fn glorot(input_size: usize, units: usize, rng: &mut StdRng) -> Self {
        Self {
            input_size,
            units,
            kernel: glorot_uniform(input_size * units, input_size, units, rng),
            bias: vec![0.0; units],
        }
    }

    pub fn num_params(&self) -> usize {
        self.kernel.len() + self.bias.len()
    }

    pub fn shape_errors(&self, name: &str, input_size: usize, units: usize) -> Vec<String> {
        let mut errors = Vec::new();
        if self.input_size != input_size || self.units != units {
            errors.push(format!(
                "{name}: expected {input_size}→{units}, found {}→{}",
                self.input_size, self.units
            ));
        }
        if self.kernel.len() != input_size * units {
            errors.push(format!(
                "{name}.kernel: expected {} values, found {}",
                input_size * units,
                self.kernel.len()
            ));
        }
        if self.bias.len() != units {
            errors.push(format!("{name}.bias: expected {units} values, found {}", self.bias.len()));
        }
        errors
    }

    /// Linear output x·W + b.
    pub fn forward(&self, x: &[f64]) -> Vec<f64> {
        let mut y = self.bias.clone();
        for (i, &xi) in x.iter().enumerate().take(self.input_size) {
            let row = &self.kernel[i * self.units..(i + 1) * self.units];
            for (yj, w) in y.iter_mut().zip(row) {
                *yj += xi * w;
            }
        }
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_glorot_within_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = LstmLayer::glorot(6, 64, &mut rng);
        let limit = (6.0_f64 / (6.0 + 256.0)).sqrt();
        assert_eq!(layer.kernel.len(), 6 * 256);
        assert!(layer.kernel.iter().all(|w| w.abs() <= limit));
        assert_eq!(layer.num_params(), 6 * 256 + 64 * 256 + 256);
    }

    #[test]
    fn test_forget_bias_is_one() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = LstmLayer::glorot(3, 4, &mut rng);
        assert_eq!(&layer.bias[4..8], &[1.0; 4]);
        assert!(layer.bias[..4].iter().chain(&layer.bias[8..]).all(|&b| b == 0.0));
    }

    #[test]
    fn test_zero_weights_single_step() {
        // All-zero weights: gates are σ(0) = 0.5, candidate tanh(0) = 0, c stays 0
        let layer = LstmLayer {
            input_size: 2,
            units: 3,
            kernel: vec![0.0; 2 * 12],
            recurrent_kernel: vec![0.0; 3 * 12],
            bias: vec![0.0; 12],
        };
        let h = layer.forward_last(&[vec![1.0, -1.0]], None);
        assert_eq!(h, vec![0.0; 3]);
    }

    #[test]
    fn test_hidden_state_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let layer = LstmLayer::glorot(4, 8, &mut rng);
        let seq: Vec<Vec<f64>> = (0..24).map(|t| vec![f64::from(t) * 3.0; 4]).collect();
        let out = layer.forward_sequence(&seq, None);
        assert_eq!(out.len(), 24);
        assert!(out.iter().flatten().all(|h| h.abs() < 1.0));
    }

    #[test]
    fn test_dense_forward() {
        let d = DenseLayer { input_size: 2, units: 2, kernel: vec![1.0, 2.0, 3.0, 4.0], bias: vec![0.5, -0.5] };
        assert_eq!(d.forward(&[1.0, 1.0]), vec![4.5, 5.5]);
    }

    #[test]
    fn test_dropout_mask_scaling() {
        let mut rng = StdRng::seed_from_u64(3);
        let mask = dropout_mask(1000, 0.2, &mut rng);
        assert!(mask.iter().all(|&m| m == 0.0 || (m - 1.25).abs() < 1e-12));
        let dropped = mask.iter().filter(|&&m| m == 0.0).count();
        assert!((100..300).contains(&dropped), "dropped {dropped}");
    }

    #[test]
    fn test_shape_errors_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut layer = LstmLayer::glorot(6, 8, &mut rng);
        assert!(layer.shape_errors("lstm", 6, 8).is_empty());
        layer.bias.pop();
        let errors = layer.shape_errors("lstm", 6, 8);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("lstm.bias"));
    }
}
