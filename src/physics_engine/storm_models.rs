//! Storm-time models: Burton-type Dst recurrence and storm morphology

use serde::{Deserialize, Serialize};

use crate::config::{defaults, DstParams};
use crate::types::SolarWindSample;

// ============================================================================
// Dst recurrence
// ============================================================================

/// Advance the ring-current index by one step (Burton et al. 1975)
///
/// ```text
/// Dst' = Dst + Δt · (Q − Dst/τ)
/// Q    = max(0, α · (VBs − V₀))
/// VBs  = v · max(−Bz, 0) · 10⁻³        (mV/m)
/// ```
///
/// ## Stability
/// Δt is clamped to `[0, τ]`, so the decay term never overshoots zero: with
/// Q ≡ 0 (northward or zero Bz) Dst relaxes monotonically toward 0 from any
/// start. A non-positive τ falls back to the default 7 h.
pub fn estimate_dst(sample: &SolarWindSample, prev_dst: f64, dt_hours: f64, params: &DstParams) -> f64 {
    let tau = if params.tau_hours.is_finite() && params.tau_hours > 0.0 {
        params.tau_hours
    } else {
        defaults::DST_TAU_HOURS
    };
    let dt = if dt_hours.is_finite() { dt_hours.clamp(0.0, tau) } else { 0.0 };
    let prev = if prev_dst.is_finite() { prev_dst } else { 0.0 };

    let v = if sample.speed.is_finite() { sample.speed.max(0.0) } else { 0.0 };
    let bs = if sample.bz.is_finite() { (-sample.bz).max(0.0) } else { 0.0 };
    let vbs = v * bs * 1e-3;

    let q = (params.alpha * (vbs - params.v0)).max(0.0);
    prev + dt * (q - prev / tau)
}

// ============================================================================
// Morphology
// ============================================================================

/// Onset character of a geomagnetic disturbance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StormMorphology {
    /// Abrupt jump in speed or density (interplanetary shock arrival)
    SuddenCommencement,
    /// Prolonged southward IMF
    Gradual,
    Unknown,
}

impl StormMorphology {
    /// Short code used by compact displays.
    pub fn code(self) -> &'static str {
        match self {
            StormMorphology::SuddenCommencement => "SC",
            StormMorphology::Gradual => "GR",
            StormMorphology::Unknown => "UNK",
        }
    }
}

impl std::fmt::Display for StormMorphology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StormMorphology::SuddenCommencement => write!(f, "Sudden Commencement"),
            StormMorphology::Gradual => write!(f, "Gradual"),
            StormMorphology::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Speed jump that marks a sudden commencement (km/s)
const SC_SPEED_JUMP: f64 = 200.0;
/// Density jump that marks a sudden commencement (p/cm³)
const SC_DENSITY_JUMP: f64 = 10.0;
/// Mean Bz below which onset is gradual (nT)
const GRADUAL_MEAN_BZ: f64 = -5.0;

/// Classify storm onset from an ordered sample history (oldest first)
///
/// The latest-vs-previous shock check runs first and takes priority over the
/// mean-Bz check. Fewer than 3 samples is not enough history: `Unknown`.
pub fn classify_morphology(history: &[SolarWindSample]) -> StormMorphology {
    if history.len() < 3 {
        return StormMorphology::Unknown;
    }

    let last = &history[history.len() - 1];
    let prev = &history[history.len() - 2];
    if last.speed - prev.speed > SC_SPEED_JUMP || last.density - prev.density > SC_DENSITY_JUMP {
        return StormMorphology::SuddenCommencement;
    }

    let finite_bz: Vec<f64> = history.iter().map(|s| s.bz).filter(|b| b.is_finite()).collect();
    if finite_bz.is_empty() {
        return StormMorphology::Unknown;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean_bz = finite_bz.iter().sum::<f64>() / finite_bz.len() as f64;
    if mean_bz < GRADUAL_MEAN_BZ {
        StormMorphology::Gradual
    } else {
        StormMorphology::Unknown
    }
}
