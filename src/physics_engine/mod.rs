//! Physics Engine Module
//!
//! Deterministic space-weather calculations. All math here is pure
//! physics/statistics - no ML involved, and no function can fail.
//!
//! ## Coupling
//! - `newell_coupling()` / `borovsky_coupling()` / `vasyliunas_coupling()`
//! - `alfven_velocity()` - model input channel
//!
//! ## Storm models
//! - `estimate_dst()` - Burton-type ring-current recurrence
//! - `classify_morphology()` - sudden commencement vs gradual onset
//!
//! ## Metrics
//! - `estimate_lag()` - L1 driver to ground response lag
//! - `coherence_index()` - multi-channel event score

pub mod coupling;
pub mod metrics;
pub mod storm_models;

pub use coupling::{alfven_velocity, borovsky_coupling, newell_coupling, vasyliunas_coupling};
pub use metrics::{coherence_index, estimate_lag};
pub use storm_models::{classify_morphology, estimate_dst, StormMorphology};

use serde::{Deserialize, Serialize};

use crate::config::DstParams;
use crate::types::SolarWindSample;

/// Everything the derived metrics need for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct MetricsInput<'a> {
    pub sample: &'a SolarWindSample,
    pub kp: f64,
    pub xray_flux: Option<f64>,
    pub proton_flux_10mev: Option<f64>,
    /// Dst carried from the previous cycle (nT)
    pub prev_dst: f64,
    /// Time since the previous cycle (hours)
    pub dt_hours: f64,
    /// Recent samples, oldest first, ending with `sample`
    pub history: &'a [SolarWindSample],
    /// Recent Newell coupling values aligned with `kp_series`
    pub coupling_series: &'a [f64],
    pub kp_series: &'a [f64],
    /// Spacing of the two series (seconds)
    pub sample_period_secs: f64,
}

/// Derived physics metrics for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub newell_coupling: f64,
    pub borovsky_coupling: f64,
    pub vasyliunas_coupling: f64,
    /// km/s
    pub alfven_velocity: f64,
    /// nT
    pub dst_estimate: f64,
    pub morphology: StormMorphology,
    /// Lag of Kp behind L1 coupling (seconds)
    pub l1_kp_lag_secs: f64,
    /// 0-100
    pub coherence_index: u8,
}

impl DerivedMetrics {
    pub fn compute(input: &MetricsInput<'_>, dst_params: &DstParams) -> Self {
        Self {
            newell_coupling: newell_coupling(input.sample),
            borovsky_coupling: borovsky_coupling(input.sample),
            vasyliunas_coupling: vasyliunas_coupling(input.sample),
            alfven_velocity: alfven_velocity(input.sample),
            dst_estimate: estimate_dst(input.sample, input.prev_dst, input.dt_hours, dst_params),
            morphology: classify_morphology(input.history),
            l1_kp_lag_secs: estimate_lag(input.coupling_series, input.kp_series, input.sample_period_secs),
            coherence_index: coherence_index(input.sample, input.kp, input.xray_flux, input.proton_flux_10mev),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_compute_bundles_every_metric() {
        let sample = SolarWindSample::new(Utc::now(), 600.0, 8.0, -10.0, 12.0);
        let history = [sample; 3];
        let input = MetricsInput {
            sample: &sample,
            kp: 6.0,
            xray_flux: Some(1e-5),
            proton_flux_10mev: None,
            prev_dst: -20.0,
            dt_hours: 1.0,
            history: &history,
            coupling_series: &[],
            kp_series: &[],
            sample_period_secs: 3600.0,
        };
        let m = DerivedMetrics::compute(&input, &DstParams::default());
        assert!((m.newell_coupling - newell_coupling(&sample)).abs() < 1e-12);
        assert!((m.dst_estimate - estimate_dst(&sample, -20.0, 1.0, &DstParams::default())).abs() < 1e-12);
        assert_eq!(m.morphology, StormMorphology::Gradual);
        assert_eq!(m.l1_kp_lag_secs, 0.0);
        assert!(m.coherence_index > 40);
    }
}
