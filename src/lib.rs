//! SKÖLL Track: space-weather analytical core
//!
//! Streaming solar-wind and geomagnetic telemetry in; multi-horizon Kp
//! forecasts, a ranked alert stack and per-city aurora windows out.
//!
//! ## Architecture
//!
//! - **Features**: fixed-length rolling per-channel history
//! - **Physics Engine**: coupling functions, Dst, morphology, lag, coherence
//! - **Forecaster**: two-layer LSTM with normalization and ensemble spread
//! - **Alerts**: NOAA G/S/R-scale and CME-impact classification
//! - **Aurora**: geomagnetic-latitude visibility windows
//! - **Pipeline**: per-cycle orchestration with stale-forecast fallback

pub mod alerts;
pub mod aurora;
pub mod config;
pub mod features;
pub mod forecaster;
pub mod physics_engine;
pub mod pipeline;
pub mod types;

pub use alerts::{AlertClassifier, AlertError, AlertInput};
pub use aurora::{AuroraError, AuroraPredictor};
pub use config::SkollConfig;
pub use features::{FeatureVector, FeatureWindow};
pub use forecaster::{ForecastError, ForecasterState, NeuralForecaster};
pub use pipeline::{CycleOutput, ForecastStatus, SpaceWeatherPipeline};
pub use types::{
    AlertEvent, AlertLevel, AlertStack, AuroraWindow, City, NeuralForecast, SolarWindSample,
    TelemetryCycle,
};
