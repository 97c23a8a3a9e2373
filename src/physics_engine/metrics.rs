//! Statistical metrics: cross-correlation lag and the event coherence index

use crate::types::SolarWindSample;

/// Estimate the lag between two equally spaced series by brute force
///
/// Searches lag ∈ [−n+1, n−1] (n = shorter length) for the maximum of
/// Σ A\[i\]·B\[i+lag\] over overlapping indices. Positive lag means `b`
/// trails `a`. The first maximum found wins, so ties resolve toward the most
/// negative lag.
///
/// ## Returns
/// `lag × sample_period` in the caller's units (e.g. seconds). Empty input
/// returns 0.
pub fn estimate_lag(a: &[f64], b: &[f64], sample_period: f64) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let n_i = i64::try_from(n).unwrap_or(i64::MAX);
    let mut best_lag: i64 = 0;
    let mut best_sum = f64::NEG_INFINITY;

    for lag in (-n_i + 1)..n_i {
        let mut sum = 0.0;
        for (i, a_i) in a.iter().take(n).enumerate() {
            let Ok(j) = usize::try_from(i64::try_from(i).unwrap_or(i64::MAX) + lag) else {
                continue;
            };
            if j >= n {
                continue;
            }
            let p = a_i * b[j];
            if p.is_finite() {
                sum += p;
            }
        }
        if sum > best_sum {
            best_sum = sum;
            best_lag = lag;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let lag = best_lag as f64;
    lag * sample_period
}

/// Composite 0-100 score of how many channels agree that an event is under way
///
/// round(100 · (0.4·normKp + 0.2·normXray + 0.2·normProton + 0.2·normWind))
///
/// - normKp = min(1, Kp/9)
/// - normXray = clamp(log₁₀(flux + 1e-9) + 9, 0, 4) / 4 (1e-9 → 0, 1e-5 → 1)
/// - normProton = min(1, flux/10000)
/// - normWind = min(1, speed/1000)
///
/// Absent or non-finite fluxes count as 0.
pub fn coherence_index(sample: &SolarWindSample, kp: f64, xray_flux: Option<f64>, proton_flux: Option<f64>) -> u8 {
    let clean = |x: f64| if x.is_finite() { x.max(0.0) } else { 0.0 };

    let norm_kp = (clean(kp) / 9.0).min(1.0);
    let xray = clean(xray_flux.unwrap_or(0.0));
    let norm_xray = ((xray + 1e-9).log10() + 9.0).clamp(0.0, 4.0) / 4.0;
    let norm_proton = (clean(proton_flux.unwrap_or(0.0)) / 10_000.0).min(1.0);
    let norm_wind = (clean(sample.speed) / 1000.0).min(1.0);

    let mix = 0.4 * norm_kp + 0.2 * norm_xray + 0.2 * norm_proton + 0.2 * norm_wind;
    // mix is bounded to [0, 1]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (mix * 100.0).round().clamp(0.0, 100.0) as u8;
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_lag_detects_shift() {
        // b is a copy of a delayed by 2 samples
        let a = [0.0, 1.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let b = [0.0, 0.0, 0.0, 1.0, 5.0, 1.0, 0.0, 0.0];
        assert_eq!(estimate_lag(&a, &b, 60.0), 120.0);
        assert_eq!(estimate_lag(&b, &a, 1.0), -2.0);
    }

    #[test]
    fn test_lag_empty_input() {
        assert_eq!(estimate_lag(&[], &[1.0, 2.0], 60.0), 0.0);
    }

    #[test]
    fn test_lag_uses_shorter_series() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 2.0, 3.0, 100.0, 100.0];
        assert_eq!(estimate_lag(&a, &b, 1.0), 0.0);
    }

    #[test]
    fn test_lag_first_maximum_wins() {
        let zeros = [0.0; 4];
        // every lag scores 0; the first (most negative) is kept
        assert_eq!(estimate_lag(&zeros, &zeros, 1.0), -3.0);
    }

    #[test]
    fn test_coherence_quiet_and_extreme() {
        let quiet = SolarWindSample::new(Utc::now(), 0.0, 5.0, 0.0, 5.0);
        assert_eq!(coherence_index(&quiet, 0.0, None, None), 0);

        let storm = SolarWindSample::new(Utc::now(), 1200.0, 20.0, -30.0, 40.0);
        assert_eq!(coherence_index(&storm, 9.0, Some(1e-3), Some(50_000.0)), 100);
    }

    #[test]
    fn test_coherence_mid_range() {
        let s = SolarWindSample::new(Utc::now(), 500.0, 5.0, 0.0, 5.0);
        // 0.4*0.5 + 0.2*(log10(1e-7 + 1e-9) + 9)/4 + 0 + 0.2*0.5
        let expected = (100.0_f64
            * (0.4 * 0.5 + 0.2 * (((1e-7_f64 + 1e-9).log10() + 9.0) / 4.0) + 0.2 * 0.5))
            .round();
        assert_eq!(f64::from(coherence_index(&s, 4.5, Some(1e-7), Some(0.0))), expected);
    }
}
