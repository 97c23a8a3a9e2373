//! Built-in observer locations and Kp outlook builders

use chrono::{DateTime, Duration, Utc};

use crate::config::AuroraConfig;
use crate::types::{City, Horizon, KpForecastPoint, NeuralForecast};

/// Well-known aurora viewing locations, both hemispheres.
pub fn default_cities() -> Vec<City> {
    [
        ("Tromsø", 69.65, 18.95, "Europe/Oslo"),
        ("Reykjavik", 64.13, -21.93, "Atlantic/Reykjavik"),
        ("Fairbanks", 64.84, -147.72, "America/Anchorage"),
        ("Yellowknife", 62.45, -114.37, "America/Yellowknife"),
        ("Rovaniemi", 66.50, 25.73, "Europe/Helsinki"),
        ("Murmansk", 68.97, 33.07, "Europe/Moscow"),
        ("Anchorage", 61.22, -149.90, "America/Anchorage"),
        ("Whitehorse", 60.72, -135.05, "America/Whitehorse"),
        ("Kiruna", 67.85, 20.23, "Europe/Stockholm"),
        ("Helsinki", 60.17, 24.94, "Europe/Helsinki"),
        ("Oslo", 59.91, 10.75, "Europe/Oslo"),
        ("Stockholm", 59.33, 18.07, "Europe/Stockholm"),
        ("Edinburgh", 55.95, -3.19, "Europe/London"),
        ("Copenhagen", 55.68, 12.57, "Europe/Copenhagen"),
        ("Inverness", 57.48, -4.22, "Europe/London"),
        ("Calgary", 51.05, -114.07, "America/Edmonton"),
        ("Winnipeg", 49.90, -97.14, "America/Winnipeg"),
        ("Berlin", 52.52, 13.40, "Europe/Berlin"),
        ("London", 51.51, -0.13, "Europe/London"),
        ("Amsterdam", 52.37, 4.90, "Europe/Amsterdam"),
        ("Dublin", 53.33, -6.25, "Europe/Dublin"),
        ("Seattle", 47.61, -122.33, "America/Los_Angeles"),
        ("Minneapolis", 44.98, -93.27, "America/Chicago"),
        ("Chicago", 41.88, -87.63, "America/Chicago"),
        ("New York", 40.71, -74.01, "America/New_York"),
        ("Nuuk", 64.18, -51.74, "America/Nuuk"),
        ("Dunedin", -45.87, 170.50, "Pacific/Auckland"),
        ("Hobart", -42.88, 147.33, "Australia/Hobart"),
        ("Ushuaia", -54.80, -68.30, "America/Argentina/Ushuaia"),
        ("Queenstown", -45.03, 168.66, "Pacific/Auckland"),
    ]
    .into_iter()
    .map(|(name, lat, lon, tz)| City { tz: Some(tz.to_string()), ..City::new(name, lat, lon) })
    .collect()
}

pub(crate) fn hours_to_duration(hours: f64) -> Duration {
    // Step lengths are a few hours at most
    #[allow(clippy::cast_possible_truncation)]
    let secs = (hours * 3600.0).round() as i64;
    Duration::seconds(secs)
}

/// Evenly spaced outlook starting at `start`, confidence decaying per step
/// (`confidence_start − confidence_decay·i`, floored at `confidence_floor`).
pub fn kp_forecast_points(
    start: DateTime<Utc>,
    kp_values: &[f64],
    step_hours: f64,
    config: &AuroraConfig,
) -> Vec<KpForecastPoint> {
    kp_values
        .iter()
        .enumerate()
        .map(|(i, &kp)| {
            #[allow(clippy::cast_precision_loss)]
            let step = i as f64;
            KpForecastPoint {
                time: start + hours_to_duration(step * step_hours),
                kp,
                confidence: Some(
                    (config.confidence_start - config.confidence_decay * step).max(config.confidence_floor),
                ),
            }
        })
        .collect()
}

/// Outlook from a neural forecast: the observed Kp at `now`, then the three
/// horizon predictions at their target times with the forecast's overall
/// confidence.
pub fn forecast_points_from_neural(
    forecast: &NeuralForecast,
    current_kp: f64,
    now: DateTime<Utc>,
) -> Vec<KpForecastPoint> {
    let mut points = vec![KpForecastPoint { time: now, kp: current_kp, confidence: None }];
    points.extend(Horizon::ALL.iter().map(|&h| {
        let window = forecast.window(h);
        KpForecastPoint {
            time: window.timestamp,
            kp: window.predicted_kp,
            confidence: Some(forecast.confidence.overall),
        }
    }));
    points
}
