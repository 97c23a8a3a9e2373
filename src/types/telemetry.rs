//! Telemetry snapshot types supplied by the upstream source each cycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CmeRecord;

/// One L1 solar-wind reading (plasma + IMF).
///
/// No invariant is enforced between `bz` and `bt`, but physically |bz| <= bt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarWindSample {
    pub timestamp: DateTime<Utc>,
    /// Bulk speed (km/s)
    pub speed: f64,
    /// Proton density (particles/cm³)
    pub density: f64,
    /// IMF north-south component (nT, GSM)
    pub bz: f64,
    /// IMF total magnitude (nT)
    pub bt: f64,
}

impl SolarWindSample {
    pub fn new(timestamp: DateTime<Utc>, speed: f64, density: f64, bz: f64, bt: f64) -> Self {
        Self { timestamp, speed, density, bz, bt }
    }

    /// Quiet-time climatological wind, used when the feed has nothing valid.
    pub fn quiet(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, 400.0, 5.0, 0.0, 5.0)
    }

    /// Whether every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.speed.is_finite() && self.density.is_finite() && self.bz.is_finite() && self.bt.is_finite()
    }
}

/// Everything the telemetry source hands the core for a single cycle.
///
/// Optional feeds default to "absent" so a sparse JSON line still parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryCycle {
    pub sample: SolarWindSample,
    /// Current planetary Kp (0-9)
    pub kp: f64,
    /// GOES long-wave X-ray flux (W/m²)
    #[serde(default)]
    pub xray_flux: Option<f64>,
    /// GOES >=10 MeV integral proton flux (pfu)
    #[serde(default)]
    pub proton_flux_10mev: Option<f64>,
    #[serde(default)]
    pub radio_blackout_active: bool,
    #[serde(default)]
    pub cme_arrivals: Vec<CmeRecord>,
    #[serde(default)]
    pub anomaly_active: bool,
    /// Upstream 3-hourly Kp outlook, first entry at cycle time
    #[serde(default)]
    pub kp_forecast: Option<Vec<f64>>,
}

impl TelemetryCycle {
    /// A cycle with only the mandatory readings set.
    pub fn basic(sample: SolarWindSample, kp: f64) -> Self {
        Self {
            sample,
            kp,
            xray_flux: None,
            proton_flux_10mev: None,
            radio_blackout_active: false,
            cme_arrivals: Vec::new(),
            anomaly_active: false,
            kp_forecast: None,
        }
    }
}

/// Model input channels, in the order the sequence model consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Speed,
    Density,
    Bz,
    Bt,
    /// Newell coupling history
    Coupling,
    AlfvenVelocity,
}

/// Number of model input channels.
pub const NUM_CHANNELS: usize = 6;

impl Channel {
    pub const ALL: [Channel; NUM_CHANNELS] = [
        Channel::Speed,
        Channel::Density,
        Channel::Bz,
        Channel::Bt,
        Channel::Coupling,
        Channel::AlfvenVelocity,
    ];

    /// Position in the feature matrix row.
    pub fn index(self) -> usize {
        match self {
            Channel::Speed => 0,
            Channel::Density => 1,
            Channel::Bz => 2,
            Channel::Bt => 3,
            Channel::Coupling => 4,
            Channel::AlfvenVelocity => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Speed => "speed",
            Channel::Density => "density",
            Channel::Bz => "bz",
            Channel::Bt => "bt",
            Channel::Coupling => "coupling",
            Channel::AlfvenVelocity => "alfven_velocity",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
