//! Alert Classifier
//!
//! Turns live readings, CME arrival predictions and the anomaly flag into a
//! ranked stack of NOAA-style alerts. Rules are evaluated independently; any
//! number may fire in one cycle. The stack is rebuilt from scratch each cycle,
//! so the classifier holds no state besides its configuration.
//!
//! ## Rules
//! 1. Geomagnetic (Kp ≥ 4): G-scale, severity ⌊Kp⌋ − 3
//! 2. Flare (flux ≥ 1e-6): letter class, R-scale blackout when active
//! 3. Radiation (≥10 MeV protons ≥ 10 pfu): S-scale
//! 4. CME impact: arrivals within (now − 2h, now + 72h)
//! 5. Anomaly: neural engine flag, severity 3

mod classify;

pub use classify::{
    classify_flare, classify_geomagnetic, classify_radiation, flare_severity, format_countdown,
    geomagnetic_severity, radio_blackout_scale,
};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{defaults, AlertConfig};
use crate::types::{
    AlertEvent, AlertLevel, AlertStack, CmeArrival, CmeRecord, FlareClass, Severity, StormClass,
    TelemetryCycle,
};

const DEFAULT_CME_MODEL: &str = "WSA-Enlil";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("malformed CME record {id}: {reason}")]
    MalformedInput { id: String, reason: String },
}

/// Per-cycle snapshot the classifier works from.
#[derive(Debug, Clone, Default)]
pub struct AlertInput {
    pub kp: f64,
    /// Carried through for callers; no rule reads it yet
    pub kp_forecast: Option<Vec<f64>>,
    /// W/m²
    pub xray_flux: Option<f64>,
    /// pfu
    pub proton_flux_10mev: Option<f64>,
    pub radio_blackout_active: bool,
    pub cme_arrivals: Vec<CmeRecord>,
    pub anomaly_active: bool,
    /// nT
    pub bz: Option<f64>,
}

impl AlertInput {
    pub fn from_cycle(cycle: &TelemetryCycle) -> Self {
        Self {
            kp: cycle.kp,
            kp_forecast: cycle.kp_forecast.clone(),
            xray_flux: cycle.xray_flux,
            proton_flux_10mev: cycle.proton_flux_10mev,
            radio_blackout_active: cycle.radio_blackout_active,
            cme_arrivals: cycle.cme_arrivals.clone(),
            anomaly_active: cycle.anomaly_active,
            bz: Some(cycle.sample.bz).filter(|bz| bz.is_finite()),
        }
    }
}

impl TryFrom<&CmeRecord> for CmeArrival {
    type Error = AlertError;

    fn try_from(rec: &CmeRecord) -> Result<Self, Self::Error> {
        let id = rec.cme_id.clone().unwrap_or_else(|| "<unknown>".to_string());
        let malformed = |reason: &str| AlertError::MalformedInput { id: id.clone(), reason: reason.to_string() };

        let cme_id = rec.cme_id.clone().filter(|s| !s.trim().is_empty()).ok_or_else(|| malformed("missing cmeId"))?;
        let parse_time = |field: &Option<String>, name: &str| -> Result<DateTime<Utc>, AlertError> {
            let raw = field.as_deref().ok_or_else(|| malformed(&format!("missing {name}")))?;
            parse_feed_time(raw).ok_or_else(|| malformed(&format!("unparseable {name} '{raw}'")))
        };
        let launch_time = parse_time(&rec.launch_time, "launchTime")?;
        let estimated_arrival = parse_time(&rec.estimated_arrival, "estimatedArrival")?;

        let predicted_kp_max = rec
            .predicted_kp_max
            .filter(|k| k.is_finite())
            .ok_or_else(|| malformed("missing predictedKpMax"))?;
        let impact_probability = match rec.impact_probability {
            Some(p) if p.is_finite() => p.clamp(0.0, 100.0),
            Some(_) => return Err(malformed("non-finite impactProbability")),
            None => 0.0,
        };

        Ok(Self {
            cme_id,
            launch_time,
            estimated_arrival,
            arrival_window_hours: rec.arrival_window_hours.filter(|h| h.is_finite()),
            impact_probability,
            predicted_kp_max,
            speed_km_s: rec.speed_km_s.filter(|s| s.is_finite()),
            model: rec.model.clone().unwrap_or_else(|| DEFAULT_CME_MODEL.to_string()),
        })
    }
}

/// Feed timestamps arrive as RFC 3339 or the DONKI short form `2026-10-14T06:00Z`.
fn parse_feed_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    let trimmed = raw.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default)]
pub struct AlertClassifier {
    config: AlertConfig,
}

impl AlertClassifier {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// Build the ranked alert stack for one snapshot.
    ///
    /// Ordering is severity descending, then timestamp descending. Malformed
    /// CME records are skipped with a warning.
    pub fn build_alert_stack(&self, input: &AlertInput, now: DateTime<Utc>) -> AlertStack {
        let mut events = Vec::new();
        let ms = now.timestamp_millis();

        if let Some(event) = self.geomagnetic_event(input, now, ms) {
            events.push(event);
        }
        if let Some(event) = self.flare_event(input, now, ms) {
            events.push(event);
        }
        if let Some(event) = self.radiation_event(input, now, ms) {
            events.push(event);
        }
        for record in &input.cme_arrivals {
            match CmeArrival::try_from(record) {
                Ok(cme) => events.extend(self.cme_event(&cme, now)),
                Err(e) => warn!(error = %e, "Skipping CME record"),
            }
        }
        if input.anomaly_active {
            events.push(anomaly_event(now, ms));
        }

        events.sort_by(|a, b| b.severity.cmp(&a.severity).then(b.timestamp.cmp(&a.timestamp)));

        let max_severity = events.iter().map(|e| e.severity.get()).max().unwrap_or(0);
        let dominant_class = events
            .first()
            .map_or_else(|| StormClass::G0.to_string(), |e| e.level.code());

        debug!(events = events.len(), max_severity, dominant = %dominant_class, "Alert stack built");

        AlertStack { events, max_severity, dominant_class, last_updated: now }
    }

    fn geomagnetic_event(&self, input: &AlertInput, now: DateTime<Utc>, ms: i64) -> Option<AlertEvent> {
        let kp = input.kp;
        if !kp.is_finite() || kp < self.config.geomagnetic_kp_threshold {
            return None;
        }
        let class = classify_geomagnetic(kp);
        let detail = match input.bz {
            Some(bz) if bz < defaults::STRONG_SOUTHWARD_BZ => {
                format!("Strongly southward Bz ({bz:.1} nT) driving enhanced coupling.")
            }
            _ if kp >= 7.0 => "Power grid fluctuations possible. HF comms degraded.".to_string(),
            _ => "Aurora visible at high latitudes.".to_string(),
        };
        Some(AlertEvent {
            id: format!("geo-{ms}"),
            level: AlertLevel::Geomagnetic(class),
            severity: geomagnetic_severity(kp),
            title: format!("{class} Geomagnetic Storm"),
            description: format!("Kp={kp:.1}. {detail}"),
            timestamp: now,
            expires_at: Some(now + Duration::hours(self.config.geomagnetic_expiry_hours)),
            countdown_secs: None,
            probability: Some((kp * 11.0).min(99.0)),
            source: "NOAA SWPC / DSCOVR".to_string(),
        })
    }

    fn flare_event(&self, input: &AlertInput, now: DateTime<Utc>, ms: i64) -> Option<AlertEvent> {
        let flux = input.xray_flux.filter(|f| f.is_finite() && *f >= self.config.flare_flux_threshold)?;
        let mut flare = classify_flare(flux);
        if input.radio_blackout_active {
            flare.blackout = radio_blackout_scale(flux);
        }
        let label = flare.label();
        let severity = flare_severity(flare.class);

        let title = match (input.radio_blackout_active, flare.blackout) {
            (true, Some(r)) => format!("{label} Solar Flare - {r} Radio Blackout"),
            (true, None) => format!("{label} Solar Flare - Radio Blackout"),
            (false, _) => format!("{label} Solar Flare - Active"),
        };
        let description = if flare.class == FlareClass::X {
            "Extreme X-ray flux. HF radio blackout on dayside hemisphere. Potential proton storm.".to_string()
        } else if input.radio_blackout_active {
            format!("Moderate {label} event. HF radio disrupted on sunlit hemisphere.")
        } else {
            format!("Moderate {label} event. Monitoring for proton event.")
        };

        Some(AlertEvent {
            id: format!("xray-{ms}"),
            level: AlertLevel::Flare(flare),
            severity,
            title,
            description,
            timestamp: now,
            expires_at: Some(now + Duration::hours(self.config.flare_expiry_hours)),
            countdown_secs: None,
            probability: Some(if severity.get() >= 4 { 90.0 } else { 70.0 }),
            source: "GOES-18 X-Ray Imager".to_string(),
        })
    }

    fn radiation_event(&self, input: &AlertInput, now: DateTime<Utc>, ms: i64) -> Option<AlertEvent> {
        let flux = input
            .proton_flux_10mev
            .filter(|f| f.is_finite() && *f >= self.config.proton_flux_threshold)?;
        let scale = classify_radiation(flux)?;
        let n = scale.number();
        let impact = if n >= 3 {
            "Satellite charging hazard. Polar aviation rerouting advised."
        } else {
            "Minor radiation storm. Polar HF impacted."
        };
        Some(AlertEvent {
            id: format!("proton-{ms}"),
            level: AlertLevel::Radiation(scale),
            severity: Severity::clamped(i64::from(n)),
            title: format!("{scale} Radiation Storm"),
            description: format!("Proton flux {flux:.1e} pfu (≥10 MeV). {impact}"),
            timestamp: now,
            expires_at: None,
            countdown_secs: None,
            probability: Some(95.0),
            source: "GOES-18 Particle Detector".to_string(),
        })
    }

    fn cme_event(&self, cme: &CmeArrival, now: DateTime<Utc>) -> Option<AlertEvent> {
        let secs_until = (cme.estimated_arrival - now).num_seconds();
        let lookback = self.config.cme_lookback_hours * 3600;
        let lookahead = self.config.cme_lookahead_hours * 3600;
        if secs_until <= -lookback || secs_until >= lookahead {
            return None;
        }
        if cme.impact_probability < self.config.min_impact_probability {
            debug!(cme = %cme.cme_id, probability = cme.impact_probability, "CME below impact filter");
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let kp_rounded = cme.predicted_kp_max.round() as i64;
        let severity = Severity::clamped(kp_rounded - 3);
        let storm_class = classify_geomagnetic(cme.predicted_kp_max);
        let kp_max = u8::try_from(kp_rounded.clamp(0, 9)).unwrap_or(9);

        let title = if secs_until < 0 {
            "CME Sheath Passage Active".to_string()
        } else {
            format!("CME Impact in {}", format_countdown(secs_until))
        };
        let speed = cme.speed_km_s.map(|s| format!(" {s:.0} km/s")).unwrap_or_default();
        let description = format!(
            "{}:{speed} CME launched {}. {:.0}% Earth impact probability. Predicted Kpmax {:.0}.",
            cme.model,
            cme.launch_time.format("%Y-%m-%dT%H:%MZ"),
            cme.impact_probability,
            cme.predicted_kp_max
        );

        Some(AlertEvent {
            id: format!("cme-{}", cme.cme_id),
            level: AlertLevel::CmeImpact { kp_max, storm_class },
            severity,
            title,
            description,
            timestamp: cme.launch_time,
            expires_at: Some(
                cme.estimated_arrival + Duration::hours(self.config.cme_expiry_after_arrival_hours),
            ),
            countdown_secs: Some(secs_until.max(0)),
            probability: Some(cme.impact_probability),
            source: "NASA DONKI / WSA-Enlil".to_string(),
        })
    }
}

fn anomaly_event(now: DateTime<Utc>, ms: i64) -> AlertEvent {
    AlertEvent {
        id: format!("anomaly-{ms}"),
        level: AlertLevel::Anomaly,
        severity: Severity::clamped(defaults::ANOMALY_SEVERITY),
        title: "LSTM Anomaly Detected".to_string(),
        description: "Neural engine reconstruction error exceeds 2σ baseline. Non-typical solar wind \
                      pattern. Monitoring for rapid Kp escalation."
            .to_string(),
        timestamp: now,
        expires_at: None,
        countdown_secs: None,
        probability: Some(60.0),
        source: "SKÖLL Neural Engine".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertType, RadiationScale, RadioBlackoutScale};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).single().expect("valid date")
    }

    fn cme(id: &str, arrival: DateTime<Utc>, kp_max: f64) -> CmeRecord {
        CmeRecord {
            cme_id: Some(id.to_string()),
            launch_time: Some((arrival - Duration::hours(40)).to_rfc3339()),
            estimated_arrival: Some(arrival.to_rfc3339()),
            arrival_window_hours: Some(7.0),
            impact_probability: Some(65.0),
            predicted_kp_max: Some(kp_max),
            speed_km_s: Some(1100.0),
            model: None,
        }
    }

    #[test]
    fn test_quiet_input_gives_neutral_stack() {
        let stack = AlertClassifier::default().build_alert_stack(&AlertInput { kp: 2.0, ..Default::default() }, now());
        assert_eq!(stack, AlertStack::neutral(now()));
    }

    #[test]
    fn test_geomagnetic_alert_fields() {
        let input = AlertInput { kp: 7.3, bz: Some(-4.0), ..Default::default() };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        let e = &stack.events[0];
        assert_eq!(e.level, AlertLevel::Geomagnetic(StormClass::G3));
        assert_eq!(e.severity.get(), 4);
        assert_eq!(e.title, "G3 Geomagnetic Storm");
        assert!(e.description.starts_with("Kp=7.3. Power grid"));
        assert_eq!(e.expires_at, Some(now() + Duration::hours(3)));
        assert!((e.probability.expect("probability") - 80.3).abs() < 1e-9);
        assert_eq!(e.id, format!("geo-{}", now().timestamp_millis()));
    }

    #[test]
    fn test_geomagnetic_probability_capped() {
        let input = AlertInput { kp: 9.0, ..Default::default() };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        assert_eq!(stack.events[0].probability, Some(99.0));
    }

    #[test]
    fn test_southward_bz_description() {
        let input = AlertInput { kp: 5.0, bz: Some(-14.2), ..Default::default() };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        assert!(stack.events[0].description.contains("Strongly southward Bz (-14.2 nT)"));
    }

    #[test]
    fn test_flare_with_blackout() {
        let input = AlertInput { kp: 1.0, xray_flux: Some(1.5e-4), radio_blackout_active: true, ..Default::default() };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        let e = &stack.events[0];
        match e.level {
            AlertLevel::Flare(f) => {
                assert_eq!(f.class, FlareClass::X);
                assert_eq!(f.blackout, Some(RadioBlackoutScale::R3));
            }
            other => panic!("expected flare, got {other:?}"),
        }
        assert_eq!(e.title, "X1.5 Solar Flare - R3 Radio Blackout");
        assert_eq!(e.severity.get(), 5);
        assert_eq!(e.probability, Some(90.0));
    }

    #[test]
    fn test_flare_below_c_ignored() {
        let input = AlertInput { xray_flux: Some(8e-7), ..Default::default() };
        assert!(AlertClassifier::default().build_alert_stack(&input, now()).is_empty());
    }

    #[test]
    fn test_cme_future_and_past() {
        let input = AlertInput {
            cme_arrivals: vec![
                cme("future", now() + Duration::hours(30) + Duration::minutes(10), 6.6),
                cme("sheath", now() - Duration::hours(1), 5.0),
                cme("too-late", now() + Duration::hours(80), 9.0),
                cme("too-old", now() - Duration::hours(3), 9.0),
            ],
            ..Default::default()
        };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        assert_eq!(stack.events.len(), 2);

        let future = stack.events.iter().find(|e| e.id == "cme-future").expect("future cme");
        assert_eq!(future.title, "CME Impact in 1d 6h");
        assert_eq!(future.severity.get(), 4);
        assert_eq!(future.level.code(), "7-G2");
        assert_eq!(future.countdown_secs, Some(30 * 3600 + 600));
        assert!(future.description.starts_with("WSA-Enlil: 1100 km/s CME launched"));

        let sheath = stack.events.iter().find(|e| e.id == "cme-sheath").expect("sheath cme");
        assert_eq!(sheath.title, "CME Sheath Passage Active");
        assert_eq!(sheath.countdown_secs, Some(0));
        assert_eq!(sheath.severity.get(), 2);
        assert_eq!(sheath.expires_at, Some(now() + Duration::hours(23)));
        assert_eq!(sheath.alert_type(), AlertType::CmeImpact);
    }

    #[test]
    fn test_low_impact_cme_clamped_to_severity_one() {
        let input = AlertInput { cme_arrivals: vec![cme("weak", now() + Duration::hours(5), 2.0)], ..Default::default() };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        assert_eq!(stack.events[0].severity.get(), 1);
    }

    #[test]
    fn test_impact_probability_filter() {
        let config = AlertConfig { min_impact_probability: 80.0, ..AlertConfig::default() };
        let input = AlertInput { cme_arrivals: vec![cme("c1", now() + Duration::hours(5), 6.0)], ..Default::default() };
        assert!(AlertClassifier::new(config).build_alert_stack(&input, now()).is_empty());
    }

    #[test]
    fn test_malformed_cme_skipped() {
        let mut bad_time = cme("bad", now() + Duration::hours(5), 6.0);
        bad_time.estimated_arrival = Some("next tuesday".to_string());
        let mut no_kp = cme("nokp", now() + Duration::hours(5), 6.0);
        no_kp.predicted_kp_max = None;
        let input = AlertInput {
            cme_arrivals: vec![bad_time, no_kp, CmeRecord::default(), cme("ok", now() + Duration::hours(5), 6.0)],
            ..Default::default()
        };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        assert_eq!(stack.events.len(), 1);
        assert_eq!(stack.events[0].id, "cme-ok");
    }

    #[test]
    fn test_donki_short_timestamps_parse() {
        let rec = CmeRecord {
            cme_id: Some("2026-10-12T04:00-CME-001".to_string()),
            launch_time: Some("2026-10-12T04:00Z".to_string()),
            estimated_arrival: Some("2026-10-14T06:00Z".to_string()),
            predicted_kp_max: Some(6.0),
            ..Default::default()
        };
        let arrival = CmeArrival::try_from(&rec).expect("valid");
        assert_eq!(arrival.estimated_arrival, Utc.with_ymd_and_hms(2026, 10, 14, 6, 0, 0).single().expect("date"));
        assert_eq!(arrival.impact_probability, 0.0);
        assert_eq!(arrival.model, "WSA-Enlil");
    }

    #[test]
    fn test_stack_sorted_and_summarised() {
        let input = AlertInput {
            kp: 5.2,
            xray_flux: Some(2.5e-5),
            proton_flux_10mev: Some(15_000.0),
            anomaly_active: true,
            cme_arrivals: vec![cme("c1", now() + Duration::hours(10), 8.0)],
            ..Default::default()
        };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        assert_eq!(stack.events.len(), 5);
        for pair in stack.events.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.severity > b.severity || (a.severity == b.severity && a.timestamp >= b.timestamp));
        }
        assert_eq!(stack.max_severity, 5);
        assert_eq!(stack.dominant_class, "8-G4");
        assert!(stack.events.iter().any(|e| e.level == AlertLevel::Radiation(RadiationScale::S4)));
    }

    #[test]
    fn test_anomaly_event() {
        let input = AlertInput { anomaly_active: true, ..Default::default() };
        let stack = AlertClassifier::default().build_alert_stack(&input, now());
        assert_eq!(stack.events[0].severity.get(), 3);
        assert_eq!(stack.dominant_class, "ANOMALY");
    }
}
