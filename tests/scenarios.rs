//! End-to-end classification scenarios
//!
//! Fixed inputs with known NOAA-scale outcomes, run through the public API.

use chrono::{DateTime, Duration, TimeZone, Utc};
use skoll_track::alerts::{AlertClassifier, AlertInput};
use skoll_track::aurora::{geo_to_mag_lat, kp_forecast_points, kp_threshold_for_mag_lat, AuroraPredictor};
use skoll_track::config::AuroraConfig;
use skoll_track::physics_engine::{newell_coupling, DerivedMetrics, MetricsInput};
use skoll_track::types::{AlertLevel, AlertType, City, FlareClass, RadiationScale, SolarWindSample, StormClass};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 18, 30, 0).single().expect("valid date")
}

// ============================================================================
// Alerts
// ============================================================================

#[test]
fn strong_storm_wind_gives_g3() {
    let sample = SolarWindSample::new(now(), 800.0, 20.0, -15.0, 18.0);
    let input = AlertInput { kp: 7.0, bz: Some(sample.bz), ..Default::default() };
    let stack = AlertClassifier::default().build_alert_stack(&input, now());

    assert_eq!(stack.events.len(), 1);
    let event = &stack.events[0];
    assert_eq!(event.alert_type(), AlertType::Geomagnetic);
    assert_eq!(event.level, AlertLevel::Geomagnetic(StormClass::G3));
    assert_eq!(event.level.code(), "G3");
    assert_eq!(event.severity.get(), 4);
    assert!(event.description.contains("Strongly southward Bz (-15.0 nT)"));

    // the same wind drives strong coupling
    assert!(newell_coupling(&sample) > 10_000.0);
}

#[test]
fn m_class_flux_gives_m2_5() {
    let input = AlertInput { xray_flux: Some(2.5e-5), ..Default::default() };
    let stack = AlertClassifier::default().build_alert_stack(&input, now());

    let event = &stack.events[0];
    assert_eq!(event.level.code(), "M2.5");
    assert_eq!(event.severity.get(), 4);
    match event.level {
        AlertLevel::Flare(flare) => {
            assert_eq!(flare.class, FlareClass::M);
            assert!((flare.magnitude - 2.5).abs() < 1e-9);
            assert_eq!(flare.blackout, None);
        }
        other => panic!("expected flare level, got {other:?}"),
    }
    assert_eq!(event.title, "M2.5 Solar Flare - Active");
}

#[test]
fn high_proton_flux_gives_s4() {
    let input = AlertInput { proton_flux_10mev: Some(15_000.0), ..Default::default() };
    let stack = AlertClassifier::default().build_alert_stack(&input, now());

    let event = &stack.events[0];
    assert_eq!(event.level, AlertLevel::Radiation(RadiationScale::S4));
    assert_eq!(event.level.code(), "S4");
    assert_eq!(event.severity.get(), 4);
    assert_eq!(stack.dominant_class, "S4");
}

#[test]
fn flare_severity_never_below_class_ordering() {
    let classifier = AlertClassifier::default();
    let mut prev = 0;
    for flux in [1e-6, 5e-6, 1e-5, 9e-5, 1e-4, 3e-3] {
        let stack = classifier.build_alert_stack(&AlertInput { xray_flux: Some(flux), ..Default::default() }, now());
        let sev = stack.events[0].severity.get();
        assert!(sev >= prev, "severity fell at flux {flux}");
        prev = sev;
    }
}

// ============================================================================
// Aurora
// ============================================================================

#[test]
fn high_latitude_city_active_on_quiet_outlook() {
    let city = City::new("Fairbanks", 64.84, -147.72);
    let mag_lat = geo_to_mag_lat(city.lat, city.lon);
    assert!((mag_lat - 66.0).abs() < 1.0, "magnetic latitude {mag_lat}");
    let threshold = kp_threshold_for_mag_lat(mag_lat);
    assert!(threshold <= 1);

    let points = kp_forecast_points(now(), &[1.0, 1.0, 2.0, 2.0, 1.0], 3.0, &AuroraConfig::default());
    let windows = AuroraPredictor::default().city_windows(&[city], &points, now());

    let w = &windows[0];
    assert!(w.active_now);
    assert_eq!(w.next_window_secs, Some(0));
    assert_eq!(w.label, "NOW");
    assert_eq!(w.kp_threshold, threshold);
}

#[test]
fn mid_latitude_city_waits_for_storm() {
    let city = City::new("Edinburgh", 55.95, -3.19);
    let points = kp_forecast_points(now(), &[2.0, 2.0, 4.0, 6.0, 3.0], 3.0, &AuroraConfig::default());
    let w = &AuroraPredictor::default().city_windows(&[city], &points, now())[0];

    assert_eq!(w.kp_threshold, 3);
    assert!(!w.active_now);
    assert_eq!(w.next_window_secs, Some(Duration::hours(6).num_seconds()));
    assert_eq!(w.label, "in 6h 0m");
    assert_eq!(w.peak_kp, 6.0);
    // three qualifying points: two 3h gaps plus the 1h default
    assert_eq!(w.duration_secs, Some(7 * 3600));
}

// ============================================================================
// Physics
// ============================================================================

#[test]
fn derived_metrics_total_on_degenerate_input() {
    let sample = SolarWindSample::new(now(), 0.0, 0.0, 0.0, 0.0);
    let metrics = DerivedMetrics::compute(
        &MetricsInput {
            sample: &sample,
            kp: 0.0,
            xray_flux: None,
            proton_flux_10mev: None,
            prev_dst: 0.0,
            dt_hours: 0.0,
            history: &[],
            coupling_series: &[],
            kp_series: &[],
            sample_period_secs: 0.0,
        },
        &skoll_track::config::DstParams::default(),
    );
    assert!(metrics.newell_coupling.is_finite());
    assert!(metrics.alfven_velocity.is_finite());
    assert!(metrics.dst_estimate.is_finite());
    assert_eq!(metrics.l1_kp_lag_secs, 0.0);
}
