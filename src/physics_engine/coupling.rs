//! Solar wind - magnetosphere coupling functions
//!
//! All functions are total: non-finite inputs are treated as 0 and negative
//! speeds or field magnitudes are floored at 0, so the result is always a
//! finite, non-negative number.

use crate::types::SolarWindSample;

/// Proton mass (kg)
const PROTON_MASS_KG: f64 = 1.67e-27;

/// Vacuum permeability (H/m)
const MU_0: f64 = 1.257e-6;

/// Alfvén velocity reported when field or density is unusable (km/s)
pub const ALFVEN_FALLBACK_KM_S: f64 = 50.0;

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Sanitised (v, bt, sin(θ/2)) for one sample.
///
/// θ is the IMF clock angle with cos θ = Bz/Bt (0 when Bt ≤ 0), clamped to
/// [-1, 1] so an inconsistent |Bz| > Bt reading cannot produce NaN.
fn clock_terms(sample: &SolarWindSample) -> (f64, f64, f64) {
    let v = finite_or_zero(sample.speed).max(0.0);
    let bt = finite_or_zero(sample.bt).max(0.0);
    let bz = finite_or_zero(sample.bz);

    let cos_theta = if bt > 0.0 { (bz / bt).clamp(-1.0, 1.0) } else { 0.0 };
    let sin_half = ((1.0 - cos_theta) / 2.0).max(0.0).sqrt();
    (v, bt, sin_half)
}

/// Newell et al. (2007) universal coupling function
///
/// ε = v^(4/3) · Bt^(2/3) · sin⁸(θ/2)
///
/// Dominant driver of the model's coupling channel. Purely northward IMF
/// (Bz = Bt) gives 0.
pub fn newell_coupling(sample: &SolarWindSample) -> f64 {
    let (v, bt, sin_half) = clock_terms(sample);
    v.powf(4.0 / 3.0) * bt.powf(2.0 / 3.0) * sin_half.powi(8)
}

/// Borovsky et al. (2008): ε = v · Bt² · sin⁴(θ/2)
pub fn borovsky_coupling(sample: &SolarWindSample) -> f64 {
    let (v, bt, sin_half) = clock_terms(sample);
    v * bt * bt * sin_half.powi(4)
}

/// Vasyliunas et al. (1982) simple form: Φ = v · Bt²
pub fn vasyliunas_coupling(sample: &SolarWindSample) -> f64 {
    let (v, bt, _) = clock_terms(sample);
    v * bt * bt
}

/// Alfvén velocity B/√(μ₀·ρ) in km/s
///
/// ρ = n · m_p with n converted from cm⁻³ to m⁻³. Returns
/// [`ALFVEN_FALLBACK_KM_S`] when Bt ≤ 0 or density ≤ 0.
pub fn alfven_velocity(sample: &SolarWindSample) -> f64 {
    let bt = finite_or_zero(sample.bt);
    let n = finite_or_zero(sample.density);
    if bt <= 0.0 || n <= 0.0 {
        return ALFVEN_FALLBACK_KM_S;
    }
    let b_tesla = bt * 1e-9;
    let rho = n * 1e6 * PROTON_MASS_KG;
    b_tesla / (MU_0 * rho).sqrt() / 1000.0
}
