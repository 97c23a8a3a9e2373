//! Shared data structures for the space-weather analytical core
//!
//! - Telemetry: SolarWindSample, TelemetryCycle, model Channel order
//! - Forecast: Horizon, PredictionWindow, NeuralForecast and its embedded alerts
//! - Alert: AlertLevel (tagged per type), AlertEvent, AlertStack, CME records
//! - Aurora: City, KpForecastPoint, AuroraWindow

mod alert;
mod aurora;
mod forecast;
mod telemetry;

pub use alert::*;
pub use aurora::*;
pub use forecast::*;
pub use telemetry::*;
