//! Feature Window Buffer
//!
//! Rolling per-channel history feeding the neural forecaster, plus the
//! slowly varying context (solar rotation, solar cycle, season) attached to
//! every snapshot.

mod window;

pub use window::FeatureWindow;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::defaults::WINDOW_LEN;
use crate::types::{Channel, NUM_CHANNELS};

/// Synodic solar rotation period (days)
const SOLAR_ROTATION_DAYS: f64 = 27.0;

/// Nominal solar cycle length (years)
const SOLAR_CYCLE_YEARS: f64 = 11.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Slowly varying context, each value in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextualFeatures {
    /// Phase within the 27-day rotation
    pub solar_rotation_phase: f64,
    /// Phase within solar cycle 25 (minimum December 2020)
    pub solar_cycle_phase: f64,
    /// Month index / 12
    pub time_of_year: f64,
}

impl ContextualFeatures {
    /// Context for a given instant.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let ms = timestamp.timestamp_millis() as f64;
        let solar_rotation_phase = (ms / (SOLAR_ROTATION_DAYS * MS_PER_DAY)).rem_euclid(1.0);

        let cycle_start = Utc
            .with_ymd_and_hms(2020, 12, 1, 0, 0, 0)
            .single()
            .map_or(0.0, |t| {
                #[allow(clippy::cast_precision_loss)]
                let start_ms = t.timestamp_millis() as f64;
                start_ms
            });
        let cycle_ms = SOLAR_CYCLE_YEARS * 365.25 * MS_PER_DAY;
        let solar_cycle_phase = ((ms - cycle_start) / cycle_ms).rem_euclid(1.0);

        let time_of_year = f64::from(timestamp.month0()) / 12.0;

        Self { solar_rotation_phase, solar_cycle_phase, time_of_year }
    }
}

/// Model input: exactly [`WINDOW_LEN`] values per channel plus context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Indexed by [`Channel::index`]; oldest value first
    pub series: [Vec<f64>; NUM_CHANNELS],
    pub context: ContextualFeatures,
}

impl FeatureVector {
    /// Build from raw series. Each series is brought to exactly
    /// [`WINDOW_LEN`] entries: longer ones keep their newest values, shorter
    /// ones are left-padded with their earliest value, empty ones become NaN.
    pub fn from_series(series: [Vec<f64>; NUM_CHANNELS], context: ContextualFeatures) -> Self {
        Self { series: series.map(|s| pad_or_slice(&s)), context }
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.series[channel.index()]
    }

    /// Time-major rows `[t][channel]`, the layout the sequence model consumes.
    pub fn as_rows(&self) -> Vec<[f64; NUM_CHANNELS]> {
        (0..WINDOW_LEN)
            .map(|t| {
                let mut row = [0.0; NUM_CHANNELS];
                for (c, series) in self.series.iter().enumerate() {
                    row[c] = series.get(t).copied().unwrap_or(f64::NAN);
                }
                row
            })
            .collect()
    }

    /// Latest value of a channel.
    pub fn latest(&self, channel: Channel) -> Option<f64> {
        self.channel(channel).last().copied()
    }
}

pub(crate) fn pad_or_slice(values: &[f64]) -> Vec<f64> {
    match values.first() {
        None => vec![f64::NAN; WINDOW_LEN],
        Some(_) if values.len() >= WINDOW_LEN => values[values.len() - WINDOW_LEN..].to_vec(),
        Some(&first) => {
            let mut out = vec![first; WINDOW_LEN - values.len()];
            out.extend_from_slice(values);
            out
        }
    }
}
