//! Configuration Module
//!
//! Operator-tunable constants for the analytical core, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `SKOLL_CONFIG` environment variable (path to TOML file)
//! 2. `skoll_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! The config is an owned value handed to the components that need it.
//! There is no process-wide instance:
//!
//! ```ignore
//! let config = SkollConfig::load();
//! let forecaster = NeuralForecaster::new(config.forecaster.clone());
//! let mut pipeline = SpaceWeatherPipeline::new(&config, forecaster);
//! ```

mod skoll_config;
pub mod defaults;

pub use skoll_config::*;
