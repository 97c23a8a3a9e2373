//! Monte-Carlo ensemble for forecast uncertainty.
//!
//! Each run perturbs the normalized input with Gaussian noise and, when
//! enabled, samples fresh dropout masks. Runs execute in parallel on the
//! rayon pool; run `i` is seeded with `seed + i`, so a given seed always
//! reproduces the same estimate regardless of scheduling.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::network::{SequenceModel, NUM_OUTPUTS};
use super::normalizer::FeatureNormalizer;
use super::ForecastError;
use crate::types::{Horizon, NUM_CHANNELS};

/// Ensemble settings for one estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleOptions {
    pub runs: usize,
    /// σ of the input perturbation (normalized units)
    pub noise_std: f64,
    pub mc_dropout: bool,
    pub seed: u64,
}

/// Spread of the denormalized Kp prediction for one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonSpread {
    pub horizon: Horizon,
    pub kp_mean: f64,
    pub kp_std: f64,
}

/// Per-output mean and population std over the ensemble runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleEstimate {
    pub runs: usize,
    /// Normalized model outputs
    pub mean: [f64; NUM_OUTPUTS],
    pub std: [f64; NUM_OUTPUTS],
    pub kp: Vec<HorizonSpread>,
}

impl EnsembleEstimate {
    pub fn spread(&self, horizon: Horizon) -> Option<&HorizonSpread> {
        self.kp.iter().find(|s| s.horizon == horizon)
    }
}

/// Run `options.runs` perturbed inferences and summarise them.
pub fn run_ensemble(
    model: &SequenceModel,
    normalizer: &FeatureNormalizer,
    rows: &[[f64; NUM_CHANNELS]],
    options: EnsembleOptions,
) -> Result<EnsembleEstimate, ForecastError> {
    if options.runs == 0 {
        return Err(ForecastError::Inference("ensemble needs at least one run".to_string()));
    }
    let noise = if options.noise_std > 0.0 {
        Some(Normal::new(0.0, options.noise_std).map_err(|e| ForecastError::Inference(e.to_string()))?)
    } else {
        None
    };

    let outputs: Vec<[f64; NUM_OUTPUTS]> = (0..options.runs)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(i as u64));
            let perturbed: Vec<[f64; NUM_CHANNELS]> = match &noise {
                Some(dist) => rows
                    .iter()
                    .map(|row| {
                        let mut r = *row;
                        for v in &mut r {
                            *v += dist.sample(&mut rng);
                        }
                        r
                    })
                    .collect(),
                None => rows.to_vec(),
            };
            if options.mc_dropout {
                model.forward_mc(&perturbed, &mut rng)
            } else {
                model.forward(&perturbed)
            }
        })
        .collect();

    let mut mean = [0.0; NUM_OUTPUTS];
    let mut std = [0.0; NUM_OUTPUTS];
    for k in 0..NUM_OUTPUTS {
        let column: Vec<f64> = outputs.iter().map(|o| o[k]).collect();
        mean[k] = column.iter().mean();
        std[k] = if column.len() > 1 { column.iter().population_std_dev() } else { 0.0 };
    }

    let kp = Horizon::ALL
        .iter()
        .map(|&h| {
            let k = h.output_offset();
            HorizonSpread {
                horizon: h,
                kp_mean: normalizer.denormalize_kp(mean[k]).clamp(0.0, 9.0),
                kp_std: std[k] * (normalizer.denormalize_kp(1.0) - normalizer.denormalize_kp(0.0)),
            }
        })
        .collect();

    Ok(EnsembleEstimate { runs: options.runs, mean, std, kp })
}
