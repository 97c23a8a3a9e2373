//! System-wide default constants.
//!
//! Centralises the numbers the analytical core was calibrated with.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Feature window
// ============================================================================

/// Rolling window length per channel (samples). Fixed by the model input shape.
pub const WINDOW_LEN: usize = 24;

/// Assumed spacing between telemetry cycles when timestamps do not advance (hours).
pub const DEFAULT_CYCLE_HOURS: f64 = 1.0;

// ============================================================================
// Normalization (mean, std) per channel
// ============================================================================

pub const SPEED_MEAN: f64 = 450.0;
pub const SPEED_STD: f64 = 120.0;
pub const DENSITY_MEAN: f64 = 7.0;
pub const DENSITY_STD: f64 = 5.0;
pub const BZ_MEAN: f64 = 0.0;
pub const BZ_STD: f64 = 5.0;
pub const BT_MEAN: f64 = 6.0;
pub const BT_STD: f64 = 3.0;
pub const COUPLING_MEAN: f64 = 5000.0;
pub const COUPLING_STD: f64 = 8000.0;
pub const ALFVEN_MEAN: f64 = 50.0;
pub const ALFVEN_STD: f64 = 30.0;
/// Output Kp statistics
pub const KP_MEAN: f64 = 2.5;
pub const KP_STD: f64 = 1.8;

/// Ψ output scale (raw model output × this).
pub const PSI_SCALE: f64 = 1000.0;

// ============================================================================
// Forecaster
// ============================================================================

/// Model agreement reported for a trained checkpoint.
pub const TRAINED_MODEL_AGREEMENT: f64 = 0.85;

/// Model agreement reported for Glorot-initialised weights.
pub const UNTRAINED_MODEL_AGREEMENT: f64 = 0.50;

/// Bz population std below which the channel counts as flatlined (nT).
pub const BZ_FLATLINE_STD: f64 = 0.1;

/// Data-quality penalty per unit fraction of missing samples.
pub const MISSING_SAMPLE_PENALTY: f64 = 0.5;

/// Data-quality penalty for a flatlined Bz channel.
pub const FLATLINE_PENALTY: f64 = 0.2;

/// Ensemble size for uncertainty estimation.
pub const ENSEMBLE_RUNS: usize = 40;

/// Gaussian input perturbation for ensemble runs (normalized units).
pub const ENSEMBLE_NOISE_STD: f64 = 0.01;

/// Base seed of ensemble runs (run i uses seed + i).
pub const ENSEMBLE_SEED: u64 = 0x5C0_11;

/// Seed of the Glorot initialisation when no checkpoint is loaded.
pub const UNTRAINED_MODEL_SEED: u64 = 42;

/// Forward-looking alert thresholds
pub const CRITICAL_STORM_PROBABILITY: f64 = 0.90;
pub const WARNING_KP: f64 = 7.0;
pub const WATCH_KP_LOW: f64 = 5.0;
pub const STRONG_SOUTHWARD_BZ: f64 = -10.0;

// ============================================================================
// Dst (Burton-type)
// ============================================================================

pub const DST_ALPHA: f64 = 0.7;
/// Injection threshold (mV/m)
pub const DST_V0: f64 = 0.49;
/// Ring-current decay time (hours)
pub const DST_TAU_HOURS: f64 = 7.0;

// ============================================================================
// Alerts
// ============================================================================

/// Minimum Kp to raise a geomagnetic alert.
pub const GEOMAGNETIC_KP_THRESHOLD: f64 = 4.0;

/// Minimum X-ray flux for a flare alert (C1, W/m²).
pub const FLARE_FLUX_THRESHOLD: f64 = 1e-6;

/// Minimum ≥10 MeV proton flux for a radiation alert (S1, pfu).
pub const PROTON_FLUX_THRESHOLD: f64 = 10.0;

pub const GEOMAGNETIC_EXPIRY_HOURS: i64 = 3;
pub const FLARE_EXPIRY_HOURS: i64 = 2;

/// CME arrivals this far in the past still count (sheath passage).
pub const CME_LOOKBACK_HOURS: i64 = 2;
/// CME arrivals further ahead than this are ignored.
pub const CME_LOOKAHEAD_HOURS: i64 = 72;
/// CME alert lifetime after arrival.
pub const CME_EXPIRY_AFTER_ARRIVAL_HOURS: i64 = 24;

/// Severity of the neural anomaly alert.
pub const ANOMALY_SEVERITY: i64 = 3;

// ============================================================================
// Aurora
// ============================================================================

/// Per-point confidence assumed when a forecast point carries none.
pub const AURORA_DEFAULT_CONFIDENCE: f64 = 0.7;

/// Duration credited to the final forecast point (hours).
pub const AURORA_DEFAULT_STEP_HOURS: f64 = 1.0;

/// Spacing of upstream Kp outlook points (hours).
pub const KP_FORECAST_STEP_HOURS: f64 = 3.0;

/// Confidence of the first forecast point and its per-step decay.
pub const KP_FORECAST_CONFIDENCE_START: f64 = 0.85;
pub const KP_FORECAST_CONFIDENCE_DECAY: f64 = 0.08;
pub const KP_FORECAST_CONFIDENCE_FLOOR: f64 = 0.1;

// ============================================================================
// Pipeline
// ============================================================================

/// Last good forecast older than this is no longer served as stale (hours).
pub const MAX_STALE_FORECAST_HOURS: i64 = 6;
