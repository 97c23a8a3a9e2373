//! Aurora visibility types: observer locations, Kp forecast points, per-city windows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observer location (geographic degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tz: Option<String>,
}

impl City {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), lat, lon, tz: None }
    }
}

/// One step of a Kp outlook.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpForecastPoint {
    pub time: DateTime<Utc>,
    pub kp: f64,
    /// 0-1; the predictor assumes 0.7 when absent
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Visibility outlook for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuroraWindow {
    pub city: City,
    /// Minimum Kp at which the oval reaches this city
    pub kp_threshold: u8,
    pub active_now: bool,
    /// 0 when active, None when nothing qualifies
    pub next_window_secs: Option<i64>,
    pub duration_secs: Option<i64>,
    pub confidence: f64,
    pub label: String,
    /// Highest Kp in the qualifying run (0 when none)
    pub peak_kp: f64,
}
