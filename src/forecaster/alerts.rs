//! Forward-looking alerts raised from predicted conditions

use chrono::{DateTime, Utc};

use crate::config::defaults::{CRITICAL_STORM_PROBABILITY, STRONG_SOUTHWARD_BZ, WARNING_KP, WATCH_KP_LOW};
use crate::types::{ForecastAlert, ForecastAlertSeverity, PredictionWindow, TimeWindow};

/// Probability attached to the strong-southward-IMF notice.
const SOUTHWARD_BZ_PROBABILITY: f64 = 0.7;

fn regions(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Evaluate the four forecast rules in severity order.
///
/// - Critical: 6h storm probability ≥ 0.90
/// - Warning: 12h Kp ≥ 7
/// - Watch: 24h Kp in [5, 7), window from the 12h to the 24h mark
/// - Info: 6h Bz < −10 nT
pub fn generate_forecast_alerts(
    six_hour: &PredictionWindow,
    twelve_hour: &PredictionWindow,
    twenty_four_hour: &PredictionWindow,
    now: DateTime<Utc>,
) -> Vec<ForecastAlert> {
    let mut alerts = Vec::new();

    if six_hour.storm_probability >= CRITICAL_STORM_PROBABILITY {
        alerts.push(ForecastAlert {
            severity: ForecastAlertSeverity::Critical,
            message: "EXTREME SOLAR STORM IMMINENT - Infrastructure at severe risk".to_string(),
            probability: six_hour.storm_probability,
            time_window: TimeWindow { start: now, end: six_hour.timestamp },
            affected_regions: regions(&["High Latitudes", "Global Power Grids", "Aviation", "Satellites"]),
        });
    }

    if twelve_hour.predicted_kp >= WARNING_KP {
        alerts.push(ForecastAlert {
            severity: ForecastAlertSeverity::Warning,
            message: format!(
                "Severe Geomagnetic Storm Forecast - Predicted Kp: {:.1}",
                twelve_hour.predicted_kp
            ),
            probability: twelve_hour.storm_probability,
            time_window: TimeWindow { start: now, end: twelve_hour.timestamp },
            affected_regions: regions(&["Northern Europe", "Canada", "Alaska", "Russia"]),
        });
    }

    if (WATCH_KP_LOW..WARNING_KP).contains(&twenty_four_hour.predicted_kp) {
        alerts.push(ForecastAlert {
            severity: ForecastAlertSeverity::Watch,
            message: "Moderate Storm Possible - Aurora watchers on alert".to_string(),
            probability: twenty_four_hour.storm_probability,
            time_window: TimeWindow { start: twelve_hour.timestamp, end: twenty_four_hour.timestamp },
            affected_regions: regions(&["Scotland", "Scandinavia", "Northern USA"]),
        });
    }

    if six_hour.predicted_bz < STRONG_SOUTHWARD_BZ {
        alerts.push(ForecastAlert {
            severity: ForecastAlertSeverity::Info,
            message: format!("Strong Southward IMF Expected - Bz: {:.1} nT", six_hour.predicted_bz),
            probability: SOUTHWARD_BZ_PROBABILITY,
            time_window: TimeWindow { start: now, end: six_hour.timestamp },
            affected_regions: regions(&["Magnetosphere", "Radiation Belts"]),
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfidenceInterval, Horizon};

    fn window(now: DateTime<Utc>, h: Horizon, kp: f64, bz: f64, p: f64) -> PredictionWindow {
        PredictionWindow {
            timestamp: now + h.duration(),
            predicted_kp: kp,
            predicted_bz: bz,
            predicted_psi: 0.0,
            storm_probability: p,
            confidence_interval: ConfidenceInterval { lower: kp, upper: kp },
        }
    }

    #[test]
    fn test_quiet_forecast_no_alerts() {
        let now = Utc::now();
        let alerts = generate_forecast_alerts(
            &window(now, Horizon::SixHour, 2.0, -1.0, 0.01),
            &window(now, Horizon::TwelveHour, 2.0, -1.0, 0.01),
            &window(now, Horizon::TwentyFourHour, 2.0, -1.0, 0.01),
            now,
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let now = Utc::now();
        let six = window(now, Horizon::SixHour, 8.0, -15.0, 0.95);
        let twelve = window(now, Horizon::TwelveHour, 7.5, -8.0, 0.99);
        let day = window(now, Horizon::TwentyFourHour, 6.0, -3.0, 0.88);
        let alerts = generate_forecast_alerts(&six, &twelve, &day, now);
        let severities: Vec<_> = alerts.iter().map(|a| a.severity).collect();
        assert_eq!(
            severities,
            vec![
                ForecastAlertSeverity::Critical,
                ForecastAlertSeverity::Warning,
                ForecastAlertSeverity::Watch,
                ForecastAlertSeverity::Info
            ]
        );
        assert_eq!(alerts[1].message, "Severe Geomagnetic Storm Forecast - Predicted Kp: 7.5");
        assert_eq!(alerts[2].time_window.start, twelve.timestamp);
        assert_eq!(alerts[3].probability, 0.7);
        assert_eq!(alerts[3].message, "Strong Southward IMF Expected - Bz: -15.0 nT");
    }

    #[test]
    fn test_watch_excludes_warning_level() {
        let now = Utc::now();
        let quiet = window(now, Horizon::SixHour, 1.0, 0.0, 0.0);
        let day = window(now, Horizon::TwentyFourHour, 7.0, 0.0, 0.9);
        let alerts = generate_forecast_alerts(&quiet, &quiet, &day, now);
        assert!(alerts.is_empty());
    }
}
