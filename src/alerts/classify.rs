//! NOAA scale classification and countdown formatting

use crate::types::{FlareClass, FlareLevel, RadiationScale, RadioBlackoutScale, Severity, StormClass};

/// NOAA G-scale from Kp: ≥9 G5, ≥8 G4, ≥7 G3, ≥6 G2, ≥5 G1, else G0.
pub fn classify_geomagnetic(kp: f64) -> StormClass {
    if kp >= 9.0 {
        StormClass::G5
    } else if kp >= 8.0 {
        StormClass::G4
    } else if kp >= 7.0 {
        StormClass::G3
    } else if kp >= 6.0 {
        StormClass::G2
    } else if kp >= 5.0 {
        StormClass::G1
    } else {
        StormClass::G0
    }
}

/// Geomagnetic alert severity: clamp(⌊kp⌋ − 3, 1, 5).
pub fn geomagnetic_severity(kp: f64) -> Severity {
    // Kp is bounded in practice; the clamp absorbs anything else
    #[allow(clippy::cast_possible_truncation)]
    let tier = if kp.is_finite() { kp.floor() as i64 - 3 } else { 1 };
    Severity::clamped(tier)
}

/// GOES flare class from long-wave X-ray flux, descending thresholds.
pub fn classify_flare(flux: f64) -> FlareLevel {
    let class = [FlareClass::X, FlareClass::M, FlareClass::C, FlareClass::B]
        .into_iter()
        .find(|c| flux >= c.threshold())
        .unwrap_or(FlareClass::A);
    FlareLevel { class, magnitude: flux / class.threshold(), blackout: None }
}

pub fn flare_severity(class: FlareClass) -> Severity {
    match class {
        FlareClass::X => Severity::clamped(5),
        FlareClass::M => Severity::clamped(4),
        FlareClass::C => Severity::clamped(3),
        FlareClass::A | FlareClass::B => Severity::clamped(2),
    }
}

/// NOAA R-scale from peak X-ray flux: M1 R1, M5 R2, X1 R3, X10 R4, X20 R5.
pub fn radio_blackout_scale(flux: f64) -> Option<RadioBlackoutScale> {
    if flux >= 2e-3 {
        Some(RadioBlackoutScale::R5)
    } else if flux >= 1e-3 {
        Some(RadioBlackoutScale::R4)
    } else if flux >= 1e-4 {
        Some(RadioBlackoutScale::R3)
    } else if flux >= 5e-5 {
        Some(RadioBlackoutScale::R2)
    } else if flux >= 1e-5 {
        Some(RadioBlackoutScale::R1)
    } else {
        None
    }
}

/// NOAA S-scale from ≥10 MeV proton flux (pfu). None below S1 (10 pfu).
pub fn classify_radiation(proton_flux: f64) -> Option<RadiationScale> {
    if proton_flux >= 100_000.0 {
        Some(RadiationScale::S5)
    } else if proton_flux >= 10_000.0 {
        Some(RadiationScale::S4)
    } else if proton_flux >= 1_000.0 {
        Some(RadiationScale::S3)
    } else if proton_flux >= 100.0 {
        Some(RadiationScale::S2)
    } else if proton_flux >= 10.0 {
        Some(RadiationScale::S1)
    } else {
        None
    }
}

/// Countdown label: under an hour "Nm", under a day "Nh Mm", else "Nd Mh".
pub fn format_countdown(seconds: i64) -> String {
    let s = seconds.max(0);
    // Round to whole minutes first so a rounded-up remainder carries into hours
    let minutes = div_round(s, 60);
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 24 * 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        let s = s.max(86_400);
        format!("{}d {}h", s / 86_400, (s % 86_400) / 3600)
    }
}

/// Non-negative integer division rounding half up.
fn div_round(n: i64, d: i64) -> i64 {
    (n + d / 2) / d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geomagnetic_table() {
        let cases = [
            (3.9, StormClass::G0),
            (5.0, StormClass::G1),
            (6.3, StormClass::G2),
            (7.0, StormClass::G3),
            (8.7, StormClass::G4),
            (9.0, StormClass::G5),
        ];
        for (kp, class) in cases {
            assert_eq!(classify_geomagnetic(kp), class, "kp {kp}");
        }
    }

    #[test]
    fn test_geomagnetic_severity_monotone() {
        let mut prev = Severity::MIN;
        for tenths in 40..=90 {
            let sev = geomagnetic_severity(f64::from(tenths) / 10.0);
            assert!(sev >= prev);
            assert!((1..=5).contains(&sev.get()));
            prev = sev;
        }
        assert_eq!(geomagnetic_severity(7.0).get(), 4);
        assert_eq!(geomagnetic_severity(4.0).get(), 1);
        assert_eq!(geomagnetic_severity(9.0).get(), 5);
    }

    #[test]
    fn test_flare_letter_and_magnitude() {
        let m = classify_flare(2.5e-5);
        assert_eq!(m.class, FlareClass::M);
        assert!((m.magnitude - 2.5).abs() < 1e-9);
        assert_eq!(m.label(), "M2.5");
        assert_eq!(flare_severity(m.class).get(), 4);

        assert_eq!(classify_flare(3e-4).label(), "X3.0");
        assert_eq!(classify_flare(4e-9).class, FlareClass::A);
        assert_eq!(flare_severity(FlareClass::B).get(), 2);
    }

    #[test]
    fn test_flare_magnitude_consistent_with_letter() {
        for flux in [1e-7, 3.3e-7, 1e-6, 9.9e-6, 1e-5, 4.2e-5, 1e-4, 2.7e-3] {
            let level = classify_flare(flux);
            assert!(level.magnitude >= 1.0, "{flux}: {}", level.magnitude);
            if level.class != FlareClass::X {
                assert!(level.magnitude < 10.0 + 1e-9, "{flux}: {}", level.magnitude);
            }
        }
    }

    #[test]
    fn test_blackout_scale() {
        assert_eq!(radio_blackout_scale(5e-6), None);
        assert_eq!(radio_blackout_scale(2.5e-5), Some(RadioBlackoutScale::R1));
        assert_eq!(radio_blackout_scale(6e-5), Some(RadioBlackoutScale::R2));
        assert_eq!(radio_blackout_scale(1.2e-4), Some(RadioBlackoutScale::R3));
        assert_eq!(radio_blackout_scale(3e-3), Some(RadioBlackoutScale::R5));
    }

    #[test]
    fn test_radiation_table() {
        assert_eq!(classify_radiation(9.9), None);
        assert_eq!(classify_radiation(10.0), Some(RadiationScale::S1));
        assert_eq!(classify_radiation(150.0), Some(RadiationScale::S2));
        assert_eq!(classify_radiation(15_000.0), Some(RadiationScale::S4));
        assert_eq!(classify_radiation(1e6), Some(RadiationScale::S5));
    }

    #[test]
    fn test_countdown_format() {
        assert_eq!(format_countdown(0), "0m");
        assert_eq!(format_countdown(90), "2m");
        assert_eq!(format_countdown(3599), "1h 0m");
        assert_eq!(format_countdown(3600 + 59 * 60 + 40), "2h 0m");
        assert_eq!(format_countdown(86_399), "1d 0h");
        assert_eq!(format_countdown(3600 + 25 * 60), "1h 25m");
        assert_eq!(format_countdown(23 * 3600 + 59 * 60), "23h 59m");
        assert_eq!(format_countdown(2 * 86_400 + 5 * 3600 + 1800), "2d 5h");
    }
}
