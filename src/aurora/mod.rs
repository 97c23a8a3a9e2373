//! Aurora Window Predictor
//!
//! Maps a Kp outlook and each city's geomagnetic latitude to a visibility
//! window. Only the first contiguous run of qualifying points is reported;
//! scanning stops as soon as that run ends.

mod cities;
mod geomagnetic;

pub use cities::{default_cities, forecast_points_from_neural, kp_forecast_points};
pub use geomagnetic::{geo_to_mag_lat, kp_threshold_for_mag_lat, GEOMAGNETIC_POLE_LAT, GEOMAGNETIC_POLE_LON};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AuroraConfig;
use crate::types::{AuroraWindow, City, KpForecastPoint};
use cities::hours_to_duration;

#[derive(Debug, Error)]
pub enum AuroraError {
    #[error("malformed city {name}: {reason}")]
    MalformedCity { name: String, reason: String },
}

/// First qualifying run found while scanning one city.
#[derive(Debug, Default)]
struct RunScan {
    start: Option<DateTime<Utc>>,
    active_now: bool,
    peak_kp: f64,
    duration_secs: Option<i64>,
    confidence_sum: f64,
    points: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AuroraPredictor {
    config: AuroraConfig,
}

impl AuroraPredictor {
    pub fn new(config: AuroraConfig) -> Self {
        Self { config }
    }

    /// One window per valid city, in input order. Cities with unusable
    /// coordinates are skipped with a warning; non-finite Kp points are
    /// ignored and the rest are scanned in time order.
    pub fn city_windows(
        &self,
        cities: &[City],
        forecast: &[KpForecastPoint],
        now: DateTime<Utc>,
    ) -> Vec<AuroraWindow> {
        let mut points: Vec<KpForecastPoint> = forecast.iter().copied().filter(|p| p.kp.is_finite()).collect();
        points.sort_by_key(|p| p.time);

        cities
            .iter()
            .filter_map(|city| match self.city_window(city, &points, now) {
                Ok(window) => Some(window),
                Err(e) => {
                    warn!(error = %e, "Skipping city");
                    None
                }
            })
            .collect()
    }

    /// Window for a single city against a time-ordered outlook.
    pub fn city_window(
        &self,
        city: &City,
        points: &[KpForecastPoint],
        now: DateTime<Utc>,
    ) -> Result<AuroraWindow, AuroraError> {
        validate_city(city)?;
        let kp_threshold = kp_threshold_for_mag_lat(geo_to_mag_lat(city.lat, city.lon));
        let scan = self.scan_first_run(points, f64::from(kp_threshold), now);

        let next_window_secs = if scan.active_now {
            Some(0)
        } else {
            scan.start.map(|start| (start - now).num_seconds().max(0))
        };
        let confidence = if scan.points > 0 { scan.confidence_sum / f64::from(scan.points) } else { 0.0 };
        let label = match next_window_secs {
            Some(secs) => window_label(secs),
            None => "None forecast".to_string(),
        };

        debug!(city = %city.name, kp_threshold, active = scan.active_now, label = %label, "Aurora window");

        Ok(AuroraWindow {
            city: city.clone(),
            kp_threshold,
            active_now: scan.active_now,
            next_window_secs,
            duration_secs: scan.duration_secs,
            confidence,
            label,
            peak_kp: scan.peak_kp,
        })
    }

    fn scan_first_run(&self, points: &[KpForecastPoint], threshold: f64, now: DateTime<Utc>) -> RunScan {
        let mut scan = RunScan::default();
        let default_step = hours_to_duration(self.config.default_step_hours);

        for (i, pt) in points.iter().enumerate() {
            if pt.kp < threshold {
                if scan.start.is_some() {
                    break;
                }
                continue;
            }
            scan.start.get_or_insert(pt.time);
            scan.confidence_sum += pt.confidence.unwrap_or(self.config.default_confidence);
            scan.points += 1;
            scan.peak_kp = scan.peak_kp.max(pt.kp);
            if pt.time <= now {
                scan.active_now = true;
            }
            let next_time = points.get(i + 1).map_or(pt.time + default_step, |next| next.time);
            let gap = (next_time - pt.time).num_seconds();
            scan.duration_secs = Some(scan.duration_secs.unwrap_or(0) + gap);
        }
        scan
    }
}

fn validate_city(city: &City) -> Result<(), AuroraError> {
    let reason = if !city.lat.is_finite() || !city.lon.is_finite() {
        Some("non-finite coordinates")
    } else if city.lat.abs() > 90.0 {
        Some("latitude outside ±90°")
    } else {
        None
    };
    reason.map_or(Ok(()), |r| Err(AuroraError::MalformedCity { name: city.name.clone(), reason: r.to_string() }))
}

/// "NOW", "in Xd" beyond 48 whole hours, "in Xh Ym" from one hour, else "in Xm".
fn window_label(secs: i64) -> String {
    if secs <= 0 {
        return "NOW".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 48 {
        format!("in {}d", (hours + 12) / 24)
    } else if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else {
        format!("in {minutes}m")
    }
}
