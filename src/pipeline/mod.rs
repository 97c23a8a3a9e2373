//! Cycle Pipeline Module
//!
//! Host-side orchestration around the analytical core: one
//! [`SpaceWeatherPipeline`] owns the rolling window and the forecaster, and
//! [`processing_loop::ProcessingLoop`] drives it from a [`source::CycleSource`].

mod coordinator;
pub mod processing_loop;
pub mod source;

pub use coordinator::{CycleOutput, ForecastStatus, PipelineStats, SpaceWeatherPipeline};
