//! Alert types: AlertLevel (per-type tagged levels), AlertEvent, AlertStack, CME feed records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// NOAA scales
// ============================================================================

/// NOAA G-scale geomagnetic storm class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StormClass {
    G0,
    G1,
    G2,
    G3,
    G4,
    G5,
}

impl StormClass {
    pub fn number(self) -> u8 {
        match self {
            StormClass::G0 => 0,
            StormClass::G1 => 1,
            StormClass::G2 => 2,
            StormClass::G3 => 3,
            StormClass::G4 => 4,
            StormClass::G5 => 5,
        }
    }
}

impl std::fmt::Display for StormClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G{}", self.number())
    }
}

/// GOES X-ray flare letter class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlareClass {
    A,
    B,
    C,
    M,
    X,
}

impl FlareClass {
    /// Lower flux bound of the class (W/m²).
    pub fn threshold(self) -> f64 {
        match self {
            FlareClass::A => 1e-8,
            FlareClass::B => 1e-7,
            FlareClass::C => 1e-6,
            FlareClass::M => 1e-5,
            FlareClass::X => 1e-4,
        }
    }

    pub fn letter(self) -> char {
        match self {
            FlareClass::A => 'A',
            FlareClass::B => 'B',
            FlareClass::C => 'C',
            FlareClass::M => 'M',
            FlareClass::X => 'X',
        }
    }
}

/// NOAA S-scale solar radiation storm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RadiationScale {
    S1,
    S2,
    S3,
    S4,
    S5,
}

impl RadiationScale {
    pub fn number(self) -> u8 {
        match self {
            RadiationScale::S1 => 1,
            RadiationScale::S2 => 2,
            RadiationScale::S3 => 3,
            RadiationScale::S4 => 4,
            RadiationScale::S5 => 5,
        }
    }
}

impl std::fmt::Display for RadiationScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.number())
    }
}

/// NOAA R-scale radio blackout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RadioBlackoutScale {
    R1,
    R2,
    R3,
    R4,
    R5,
}

impl RadioBlackoutScale {
    pub fn number(self) -> u8 {
        match self {
            RadioBlackoutScale::R1 => 1,
            RadioBlackoutScale::R2 => 2,
            RadioBlackoutScale::R3 => 3,
            RadioBlackoutScale::R4 => 4,
            RadioBlackoutScale::R5 => 5,
        }
    }
}

impl std::fmt::Display for RadioBlackoutScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.number())
    }
}

/// Flare class plus magnitude within the class (e.g. M2.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlareLevel {
    pub class: FlareClass,
    /// flux / class threshold
    pub magnitude: f64,
    /// Active radio blackout scale, when the feed reports one
    #[serde(default)]
    pub blackout: Option<RadioBlackoutScale>,
}

impl FlareLevel {
    /// Label with one decimal, e.g. "X1.2".
    pub fn label(&self) -> String {
        format!("{}{:.1}", self.class.letter(), self.magnitude)
    }
}

// ============================================================================
// Alert events
// ============================================================================

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Geomagnetic,
    Radiation,
    Blackout,
    Flare,
    CmeImpact,
    Anomaly,
}

/// Alert level, each variant carrying its own scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Geomagnetic(StormClass),
    Flare(FlareLevel),
    Radiation(RadiationScale),
    /// Stand-alone R-scale event. `build_alert_stack` folds blackouts into the
    /// flare event instead of emitting this.
    Blackout(RadioBlackoutScale),
    CmeImpact { kp_max: u8, storm_class: StormClass },
    Anomaly,
}

impl AlertLevel {
    pub fn alert_type(&self) -> AlertType {
        match self {
            AlertLevel::Geomagnetic(_) => AlertType::Geomagnetic,
            AlertLevel::Flare(_) => AlertType::Flare,
            AlertLevel::Radiation(_) => AlertType::Radiation,
            AlertLevel::Blackout(_) => AlertType::Blackout,
            AlertLevel::CmeImpact { .. } => AlertType::CmeImpact,
            AlertLevel::Anomaly => AlertType::Anomaly,
        }
    }

    /// Display-layer level code ("G3", "M2.5", "S4", "5-G1", "ANOMALY").
    pub fn code(&self) -> String {
        match self {
            AlertLevel::Geomagnetic(g) => g.to_string(),
            AlertLevel::Flare(flare) => flare.label(),
            AlertLevel::Radiation(s) => s.to_string(),
            AlertLevel::Blackout(r) => r.to_string(),
            AlertLevel::CmeImpact { kp_max, storm_class } => format!("{kp_max}-{storm_class}"),
            AlertLevel::Anomaly => "ANOMALY".to_string(),
        }
    }
}

/// Alert severity tier, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

/// Severity tier outside 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("severity {0} outside 1..=5")]
pub struct SeverityOutOfRange(pub u8);

impl Severity {
    pub const MIN: Severity = Severity(1);
    pub const MAX: Severity = Severity(5);

    /// Clamp an arbitrary tier into 1..=5.
    pub fn clamped(tier: i64) -> Self {
        // Clamp keeps the value in 1..=5, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Severity(tier.clamp(1, 5) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Severity {
    type Error = SeverityOutOfRange;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        if (Self::MIN.0..=Self::MAX.0).contains(&tier) {
            Ok(Severity(tier))
        } else {
            Err(SeverityOutOfRange(tier))
        }
    }
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> u8 {
        s.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub level: AlertLevel,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Seconds until impact / expiry
    #[serde(default)]
    pub countdown_secs: Option<i64>,
    /// 0-100
    #[serde(default)]
    pub probability: Option<f64>,
    pub source: String,
}

impl AlertEvent {
    pub fn alert_type(&self) -> AlertType {
        self.level.alert_type()
    }
}

/// Ranked alert stack, rebuilt wholesale each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStack {
    /// Severity descending, then timestamp descending
    pub events: Vec<AlertEvent>,
    /// 0 when there are no events
    pub max_severity: u8,
    /// Level code of the top event, "G0" when empty
    pub dominant_class: String,
    pub last_updated: DateTime<Utc>,
}

impl AlertStack {
    /// Quiet stack: no events, G0.
    pub fn neutral(now: DateTime<Utc>) -> Self {
        Self {
            events: Vec::new(),
            max_severity: 0,
            dominant_class: StormClass::G0.to_string(),
            last_updated: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ============================================================================
// CME feed
// ============================================================================

/// CME arrival record as delivered by the upstream feed (DONKI / WSA-Enlil).
///
/// Every field is optional here; validation into [`CmeArrival`] happens in the
/// alert classifier so one bad record never aborts the stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CmeRecord {
    pub cme_id: Option<String>,
    /// ISO-8601
    pub launch_time: Option<String>,
    /// ISO-8601
    pub estimated_arrival: Option<String>,
    /// ± arrival uncertainty (hours)
    pub arrival_window_hours: Option<f64>,
    /// 0-100
    pub impact_probability: Option<f64>,
    pub predicted_kp_max: Option<f64>,
    #[serde(rename = "speed_km_s")]
    pub speed_km_s: Option<f64>,
    pub model: Option<String>,
}

/// Validated CME arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmeArrival {
    pub cme_id: String,
    pub launch_time: DateTime<Utc>,
    pub estimated_arrival: DateTime<Utc>,
    pub arrival_window_hours: Option<f64>,
    /// 0-100
    pub impact_probability: f64,
    pub predicted_kp_max: f64,
    pub speed_km_s: Option<f64>,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_codes() {
        assert_eq!(AlertLevel::Geomagnetic(StormClass::G3).code(), "G3");
        assert_eq!(AlertLevel::Radiation(RadiationScale::S4).code(), "S4");
        let flare = FlareLevel { class: FlareClass::M, magnitude: 2.5, blackout: None };
        assert_eq!(AlertLevel::Flare(flare).code(), "M2.5");
        let cme = AlertLevel::CmeImpact { kp_max: 5, storm_class: StormClass::G1 };
        assert_eq!(cme.code(), "5-G1");
        assert_eq!(AlertLevel::Anomaly.code(), "ANOMALY");
    }

    #[test]
    fn test_level_maps_to_type() {
        assert_eq!(AlertLevel::Geomagnetic(StormClass::G1).alert_type(), AlertType::Geomagnetic);
        assert_eq!(AlertLevel::Blackout(RadioBlackoutScale::R3).alert_type(), AlertType::Blackout);
        assert_eq!(
            AlertLevel::CmeImpact { kp_max: 6, storm_class: StormClass::G2 }.alert_type(),
            AlertType::CmeImpact
        );
    }

    #[test]
    fn test_severity_clamps() {
        assert_eq!(Severity::clamped(-4).get(), 1);
        assert_eq!(Severity::clamped(3).get(), 3);
        assert_eq!(Severity::clamped(12).get(), 5);
    }

    #[test]
    fn test_severity_rejects_out_of_range_json() {
        let ok: Severity = serde_json::from_str("4").expect("in range");
        assert_eq!(ok.get(), 4);
        assert_eq!(serde_json::to_string(&ok).expect("serialize"), "4");
        assert!(serde_json::from_str::<Severity>("0").is_err());
        assert!(serde_json::from_str::<Severity>("6").is_err());
        assert_eq!(Severity::try_from(9), Err(SeverityOutOfRange(9)));
    }

    #[test]
    fn test_level_serializes_with_type_tag() {
        let json = serde_json::to_value(AlertLevel::Geomagnetic(StormClass::G2)).expect("serialize");
        assert_eq!(json["type"], "GEOMAGNETIC");
        assert_eq!(json["value"], "G2");
    }

    #[test]
    fn test_cme_record_accepts_feed_field_names() {
        let json = r#"{"cmeId": "2026-10-12T04:00-CME-001", "estimatedArrival": "2026-10-14T06:00Z",
                       "predictedKpMax": 6, "speed_km_s": 900}"#;
        let rec: CmeRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(rec.cme_id.as_deref(), Some("2026-10-12T04:00-CME-001"));
        assert_eq!(rec.predicted_kp_max, Some(6.0));
        assert_eq!(rec.speed_km_s, Some(900.0));
        assert!(rec.launch_time.is_none());
    }

    #[test]
    fn test_neutral_stack() {
        let stack = AlertStack::neutral(Utc::now());
        assert!(stack.is_empty());
        assert_eq!(stack.max_severity, 0);
        assert_eq!(stack.dominant_class, "G0");
    }
}
