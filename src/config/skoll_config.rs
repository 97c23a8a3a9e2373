//! Skoll Configuration - tunable model, alert and aurora constants as TOML values
//!
//! Each struct implements `Default` with values from [`super::defaults`], so
//! behaviour without a config file is the calibrated one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `SkollConfig::load()` which searches:
/// 1. `$SKOLL_CONFIG` env var
/// 2. `./skoll_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkollConfig {
    /// Normalization, ensemble and data-quality tuning
    #[serde(default)]
    pub forecaster: ForecasterConfig,

    /// Burton-type Dst model constants
    #[serde(default)]
    pub dst: DstParams,

    /// Alert classifier thresholds and lifetimes
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Aurora window predictor tuning
    #[serde(default)]
    pub aurora: AuroraConfig,

    /// Cycle pipeline policy
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl SkollConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SKOLL_CONFIG` environment variable
    /// 2. `./skoll_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("SKOLL_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from SKOLL_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SKOLL_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SKOLL_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("skoll_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./skoll_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./skoll_config.toml, using defaults");
                }
            }
        }

        info!("No skoll_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path. The result is validated.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(parent.to_path_buf(), e))?;
        }
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Validate every section, collecting all problems.
    ///
    /// Rules:
    /// - Normalization std devs must be > 0
    /// - Probabilities and confidences must lie in their unit ranges
    /// - Windows, lifetimes and ensemble sizes must be positive
    /// - Every value must be finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let n = &self.forecaster.normalization;
        for (name, stats) in [
            ("speed", n.speed),
            ("density", n.density),
            ("bz", n.bz),
            ("bt", n.bt),
            ("coupling", n.coupling),
            ("alfven_velocity", n.alfven_velocity),
            ("kp", n.kp),
        ] {
            if !stats.mean.is_finite() || !stats.std.is_finite() {
                errors.push(format!("forecaster.normalization.{name}: mean and std must be finite"));
            } else if stats.std <= 0.0 {
                errors.push(format!(
                    "forecaster.normalization.{name}.std must be > 0 (got {:.3})",
                    stats.std
                ));
            }
        }

        let f = &self.forecaster;
        if f.ensemble_runs == 0 {
            errors.push("forecaster.ensemble_runs must be > 0".to_string());
        }
        if f.ensemble_noise_std < 0.0 {
            errors.push("forecaster.ensemble_noise_std must be >= 0".to_string());
        }
        Self::check_unit("forecaster.trained_model_agreement", f.trained_model_agreement, &mut errors);
        Self::check_unit("forecaster.untrained_model_agreement", f.untrained_model_agreement, &mut errors);
        if f.bz_flatline_std < 0.0 {
            errors.push("forecaster.bz_flatline_std must be >= 0".to_string());
        }

        if self.dst.tau_hours <= 0.0 {
            errors.push(format!("dst.tau_hours must be > 0 (got {:.2})", self.dst.tau_hours));
        }
        if self.dst.alpha < 0.0 {
            errors.push("dst.alpha must be >= 0".to_string());
        }

        let a = &self.alerts;
        if !(0.0..=100.0).contains(&a.min_impact_probability) {
            errors.push(format!(
                "alerts.min_impact_probability must be within 0-100 (got {:.1})",
                a.min_impact_probability
            ));
        }
        if a.cme_lookahead_hours <= 0 {
            errors.push("alerts.cme_lookahead_hours must be > 0".to_string());
        }
        if a.cme_lookback_hours < 0 {
            errors.push("alerts.cme_lookback_hours must be >= 0".to_string());
        }
        if a.geomagnetic_expiry_hours <= 0 || a.flare_expiry_hours <= 0 {
            errors.push("alerts expiry hours must be > 0".to_string());
        }

        let au = &self.aurora;
        Self::check_unit("aurora.default_confidence", au.default_confidence, &mut errors);
        Self::check_unit("aurora.confidence_start", au.confidence_start, &mut errors);
        Self::check_unit("aurora.confidence_floor", au.confidence_floor, &mut errors);
        if au.default_step_hours <= 0.0 || au.forecast_step_hours <= 0.0 {
            errors.push("aurora step hours must be > 0".to_string());
        }
        if au.confidence_decay < 0.0 {
            errors.push("aurora.confidence_decay must be >= 0".to_string());
        }

        let p = &self.pipeline;
        if p.default_cycle_hours <= 0.0 {
            errors.push("pipeline.default_cycle_hours must be > 0".to_string());
        }
        if p.max_stale_forecast_hours < 0 {
            errors.push("pipeline.max_stale_forecast_hours must be >= 0".to_string());
        }

        // NaN/Inf slip through comparisons; sweep the serialized form
        if let Ok(s) = toml::to_string(self) {
            if s.contains("nan") || s.contains("inf") {
                errors.push("Config contains NaN or Inf values, all values must be finite".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_unit(name: &str, value: f64, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&value) {
            errors.push(format!("{name} must be within 0-1 (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Forecaster
// ============================================================================

/// Mean and standard deviation of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub std: f64,
}

impl ChannelStats {
    pub const fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

/// Fixed normalization statistics the model was trained against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub speed: ChannelStats,
    pub density: ChannelStats,
    pub bz: ChannelStats,
    pub bt: ChannelStats,
    pub coupling: ChannelStats,
    pub alfven_velocity: ChannelStats,
    /// Output Kp
    pub kp: ChannelStats,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            speed: ChannelStats::new(defaults::SPEED_MEAN, defaults::SPEED_STD),
            density: ChannelStats::new(defaults::DENSITY_MEAN, defaults::DENSITY_STD),
            bz: ChannelStats::new(defaults::BZ_MEAN, defaults::BZ_STD),
            bt: ChannelStats::new(defaults::BT_MEAN, defaults::BT_STD),
            coupling: ChannelStats::new(defaults::COUPLING_MEAN, defaults::COUPLING_STD),
            alfven_velocity: ChannelStats::new(defaults::ALFVEN_MEAN, defaults::ALFVEN_STD),
            kp: ChannelStats::new(defaults::KP_MEAN, defaults::KP_STD),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecasterConfig {
    pub normalization: NormalizationConfig,
    /// Default ensemble size
    pub ensemble_runs: usize,
    /// Gaussian input perturbation σ (normalized units)
    pub ensemble_noise_std: f64,
    /// Apply dropout masks during ensemble runs
    pub mc_dropout: bool,
    /// Base seed of the ensemble runs
    pub ensemble_seed: u64,
    pub trained_model_agreement: f64,
    pub untrained_model_agreement: f64,
    /// Bz std (nT) below which the channel is reported flatlined
    pub bz_flatline_std: f64,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationConfig::default(),
            ensemble_runs: defaults::ENSEMBLE_RUNS,
            ensemble_noise_std: defaults::ENSEMBLE_NOISE_STD,
            mc_dropout: true,
            ensemble_seed: defaults::ENSEMBLE_SEED,
            trained_model_agreement: defaults::TRAINED_MODEL_AGREEMENT,
            untrained_model_agreement: defaults::UNTRAINED_MODEL_AGREEMENT,
            bz_flatline_std: defaults::BZ_FLATLINE_STD,
        }
    }
}

// ============================================================================
// Dst
// ============================================================================

/// Burton-type ring-current model constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DstParams {
    /// Injection efficiency
    pub alpha: f64,
    /// Injection threshold (mV/m)
    pub v0: f64,
    /// Decay time (hours)
    pub tau_hours: f64,
}

impl Default for DstParams {
    fn default() -> Self {
        Self {
            alpha: defaults::DST_ALPHA,
            v0: defaults::DST_V0,
            tau_hours: defaults::DST_TAU_HOURS,
        }
    }
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub geomagnetic_kp_threshold: f64,
    /// W/m²
    pub flare_flux_threshold: f64,
    /// pfu
    pub proton_flux_threshold: f64,
    pub geomagnetic_expiry_hours: i64,
    pub flare_expiry_hours: i64,
    pub cme_lookback_hours: i64,
    pub cme_lookahead_hours: i64,
    pub cme_expiry_after_arrival_hours: i64,
    /// CME arrivals below this impact probability (0-100) are dropped. 0 keeps all.
    pub min_impact_probability: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            geomagnetic_kp_threshold: defaults::GEOMAGNETIC_KP_THRESHOLD,
            flare_flux_threshold: defaults::FLARE_FLUX_THRESHOLD,
            proton_flux_threshold: defaults::PROTON_FLUX_THRESHOLD,
            geomagnetic_expiry_hours: defaults::GEOMAGNETIC_EXPIRY_HOURS,
            flare_expiry_hours: defaults::FLARE_EXPIRY_HOURS,
            cme_lookback_hours: defaults::CME_LOOKBACK_HOURS,
            cme_lookahead_hours: defaults::CME_LOOKAHEAD_HOURS,
            cme_expiry_after_arrival_hours: defaults::CME_EXPIRY_AFTER_ARRIVAL_HOURS,
            min_impact_probability: 0.0,
        }
    }
}

// ============================================================================
// Aurora
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuroraConfig {
    /// Per-point confidence when a point carries none
    pub default_confidence: f64,
    /// Duration credited to the last point of a series (hours)
    pub default_step_hours: f64,
    /// Spacing of upstream Kp outlook points (hours)
    pub forecast_step_hours: f64,
    pub confidence_start: f64,
    pub confidence_decay: f64,
    pub confidence_floor: f64,
}

impl Default for AuroraConfig {
    fn default() -> Self {
        Self {
            default_confidence: defaults::AURORA_DEFAULT_CONFIDENCE,
            default_step_hours: defaults::AURORA_DEFAULT_STEP_HOURS,
            forecast_step_hours: defaults::KP_FORECAST_STEP_HOURS,
            confidence_start: defaults::KP_FORECAST_CONFIDENCE_START,
            confidence_decay: defaults::KP_FORECAST_CONFIDENCE_DECAY,
            confidence_floor: defaults::KP_FORECAST_CONFIDENCE_FLOOR,
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dst integration step when consecutive timestamps do not advance (hours)
    pub default_cycle_hours: f64,
    /// Age beyond which the last good forecast is reported unavailable (hours)
    pub max_stale_forecast_hours: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_cycle_hours: defaults::DEFAULT_CYCLE_HOURS,
            max_stale_forecast_hours: defaults::MAX_STALE_FORECAST_HOURS,
        }
    }
}
