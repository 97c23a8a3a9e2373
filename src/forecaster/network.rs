//! Stacked-LSTM sequence model.
//!
//! ```text
//! [24 × 6] → LSTM(64, full sequence) → LSTM(32, final state)
//!          → Dense(24, ReLU, L2 0.01) → Dropout(0.3) → Dense(9, linear)
//! ```
//!
//! Output order is `[Kp, Bz, Ψ] × {6h, 12h, 24h}`, all in normalized units.
//! Dropout layers are the identity in deterministic inference and sample
//! fresh masks only in Monte-Carlo runs.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::lstm::{dropout_mask, DenseLayer, LstmDropout, LstmLayer};
use crate::types::NUM_CHANNELS;

pub const LSTM1_UNITS: usize = 64;
pub const LSTM2_UNITS: usize = 32;
pub const DENSE_UNITS: usize = 24;
/// [Kp, Bz, Ψ] for each of the three horizons
pub const NUM_OUTPUTS: usize = 9;

/// Input and recurrent dropout of both LSTM layers.
pub const LSTM_DROPOUT: f64 = 0.2;
/// Dropout after the ReLU dense layer.
pub const DENSE_DROPOUT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceModel {
    pub lstm1: LstmLayer,
    pub lstm2: LstmLayer,
    pub dense: DenseLayer,
    pub output: DenseLayer,
}

impl SequenceModel {
    /// Deterministic Glorot-initialised model.
    pub fn glorot(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            lstm1: LstmLayer::glorot(NUM_CHANNELS, LSTM1_UNITS, &mut rng),
            lstm2: LstmLayer::glorot(LSTM1_UNITS, LSTM2_UNITS, &mut rng),
            dense: DenseLayer::glorot(LSTM2_UNITS, DENSE_UNITS, &mut rng),
            output: DenseLayer::glorot(DENSE_UNITS, NUM_OUTPUTS, &mut rng),
        }
    }

    pub fn num_params(&self) -> usize {
        self.lstm1.num_params() + self.lstm2.num_params() + self.dense.num_params() + self.output.num_params()
    }

    /// Every shape problem in the stored weights; empty when the model is usable.
    pub fn shape_errors(&self) -> Vec<String> {
        let mut errors = self.lstm1.shape_errors("lstm1", NUM_CHANNELS, LSTM1_UNITS);
        errors.extend(self.lstm2.shape_errors("lstm2", LSTM1_UNITS, LSTM2_UNITS));
        errors.extend(self.dense.shape_errors("dense", LSTM2_UNITS, DENSE_UNITS));
        errors.extend(self.output.shape_errors("output", DENSE_UNITS, NUM_OUTPUTS));
        errors
    }

    /// Deterministic forward pass over normalized time-major rows.
    pub fn forward(&self, rows: &[[f64; NUM_CHANNELS]]) -> [f64; NUM_OUTPUTS] {
        self.run(rows, None)
    }

    /// Forward pass with dropout masks sampled from `rng`.
    pub fn forward_mc(&self, rows: &[[f64; NUM_CHANNELS]], rng: &mut StdRng) -> [f64; NUM_OUTPUTS] {
        self.run(rows, Some(rng))
    }

    fn run(&self, rows: &[[f64; NUM_CHANNELS]], mut rng: Option<&mut StdRng>) -> [f64; NUM_OUTPUTS] {
        let inputs: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();

        let d1 = rng
            .as_deref_mut()
            .map(|r| LstmDropout::sample(NUM_CHANNELS, LSTM1_UNITS, LSTM_DROPOUT, LSTM_DROPOUT, r));
        let seq = self.lstm1.forward_sequence(&inputs, d1.as_ref());

        let d2 = rng
            .as_deref_mut()
            .map(|r| LstmDropout::sample(LSTM1_UNITS, LSTM2_UNITS, LSTM_DROPOUT, LSTM_DROPOUT, r));
        let last = self.lstm2.forward_last(&seq, d2.as_ref());

        let mut hidden: Vec<f64> = self.dense.forward(&last).into_iter().map(|v| v.max(0.0)).collect();
        if let Some(r) = rng.as_deref_mut() {
            let mask = dropout_mask(DENSE_UNITS, DENSE_DROPOUT, r);
            for (h, m) in hidden.iter_mut().zip(mask) {
                *h *= m;
            }
        }

        let out = self.output.forward(&hidden);
        let mut result = [0.0; NUM_OUTPUTS];
        for (dst, v) in result.iter_mut().zip(out) {
            *dst = v;
        }
        result
    }
}
