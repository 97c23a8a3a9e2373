//! Forecast types: PredictionWindow, NeuralForecast, ForecastAlert, DataQualityIssue

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Channel;

/// Forecast horizon of one prediction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    SixHour,
    TwelveHour,
    TwentyFourHour,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::SixHour, Horizon::TwelveHour, Horizon::TwentyFourHour];

    pub fn hours(self) -> i64 {
        match self {
            Horizon::SixHour => 6,
            Horizon::TwelveHour => 12,
            Horizon::TwentyFourHour => 24,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::hours(self.hours())
    }

    /// Confidence-interval half-width in normalized Kp units (widens with horizon).
    pub fn ci_half_width(self) -> f64 {
        match self {
            Horizon::SixHour => 0.5,
            Horizon::TwelveHour => 0.8,
            Horizon::TwentyFourHour => 1.2,
        }
    }

    /// Offset of this horizon's [Kp, Bz, Ψ] triple in the model output.
    pub fn output_offset(self) -> usize {
        match self {
            Horizon::SixHour => 0,
            Horizon::TwelveHour => 3,
            Horizon::TwentyFourHour => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Prediction for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionWindow {
    /// Time the prediction applies to
    pub timestamp: DateTime<Utc>,
    /// Expected Kp (0-9)
    pub predicted_kp: f64,
    /// Expected IMF Bz (nT)
    pub predicted_bz: f64,
    /// Infrastructure fatigue coefficient Ψ
    pub predicted_psi: f64,
    /// Chance of Kp >= 5 (0-1)
    pub storm_probability: f64,
    pub confidence_interval: ConfidenceInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfidence {
    /// Mean of model agreement and data quality
    pub overall: f64,
    pub model_agreement: f64,
    pub data_quality: f64,
}

/// Non-fatal input degradation detected while assessing a feature window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// Fraction (0-1) of NaN / missing samples across all channels
    MissingSamples { fraction: f64 },
    /// Channel whose standard deviation is suspiciously close to zero
    FlatlinedChannel { channel: Channel },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ForecastAlertSeverity {
    Info,
    Watch,
    Warning,
    Critical,
}

impl std::fmt::Display for ForecastAlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastAlertSeverity::Info => write!(f, "Info"),
            ForecastAlertSeverity::Watch => write!(f, "Watch"),
            ForecastAlertSeverity::Warning => write!(f, "Warning"),
            ForecastAlertSeverity::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Forward-looking alert raised from *predicted* conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAlert {
    pub severity: ForecastAlertSeverity,
    pub message: String,
    /// 0-1
    pub probability: f64,
    pub time_window: TimeWindow,
    pub affected_regions: Vec<String>,
}

/// Full multi-horizon forecast, rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralForecast {
    pub generated_at: DateTime<Utc>,
    pub six_hour: PredictionWindow,
    pub twelve_hour: PredictionWindow,
    pub twenty_four_hour: PredictionWindow,
    pub confidence: ForecastConfidence,
    pub alerts: Vec<ForecastAlert>,
    #[serde(default)]
    pub data_quality_issues: Vec<DataQualityIssue>,
}

impl NeuralForecast {
    pub fn window(&self, horizon: Horizon) -> &PredictionWindow {
        match horizon {
            Horizon::SixHour => &self.six_hour,
            Horizon::TwelveHour => &self.twelve_hour,
            Horizon::TwentyFourHour => &self.twenty_four_hour,
        }
    }

    /// Peak predicted Kp across horizons.
    pub fn peak_kp(&self) -> f64 {
        Horizon::ALL
            .iter()
            .map(|h| self.window(*h).predicted_kp)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_width_grows_with_horizon() {
        let widths: Vec<f64> = Horizon::ALL.iter().map(|h| h.ci_half_width()).collect();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_output_offsets_cover_nine_outputs() {
        let offsets: Vec<usize> = Horizon::ALL.iter().map(|h| h.output_offset()).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ForecastAlertSeverity::Critical > ForecastAlertSeverity::Warning);
        assert!(ForecastAlertSeverity::Watch > ForecastAlertSeverity::Info);
    }
}
