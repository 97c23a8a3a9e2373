//! Fixed-capacity rolling history, one ring per model channel

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::{pad_or_slice, ContextualFeatures, FeatureVector};
use crate::config::defaults::WINDOW_LEN;
use crate::physics_engine::{alfven_velocity, newell_coupling};
use crate::types::{Channel, SolarWindSample, NUM_CHANNELS};

/// Rolling per-channel history of the last [`WINDOW_LEN`] observations.
///
/// Single writer; mutation needs `&mut self`, so no internal locking.
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    channels: [VecDeque<f64>; NUM_CHANNELS],
    capacity: usize,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Default for FeatureWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureWindow {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| VecDeque::with_capacity(WINDOW_LEN)),
            capacity: WINDOW_LEN,
            last_timestamp: None,
        }
    }

    /// Append one value; once full the oldest entry drops.
    pub fn push(&mut self, channel: Channel, value: f64) {
        let ring = &mut self.channels[channel.index()];
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(value);
    }

    /// Push the four raw channels plus derived Newell coupling and Alfvén velocity.
    ///
    /// Non-finite raw readings are stored as-is so the forecaster can count
    /// them as missing; the derived channels are always finite.
    pub fn push_sample(&mut self, sample: &SolarWindSample) {
        self.push(Channel::Speed, sample.speed);
        self.push(Channel::Density, sample.density);
        self.push(Channel::Bz, sample.bz);
        self.push(Channel::Bt, sample.bt);
        self.push(Channel::Coupling, newell_coupling(sample));
        self.push(Channel::AlfvenVelocity, alfven_velocity(sample));
        self.last_timestamp = Some(sample.timestamp);
    }

    /// Number of stored values for a channel.
    pub fn len(&self, channel: Channel) -> usize {
        self.channels[channel.index()].len()
    }

    /// True when no channel holds any value.
    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(VecDeque::is_empty)
    }

    pub fn clear(&mut self) {
        for ring in &mut self.channels {
            ring.clear();
        }
        self.last_timestamp = None;
    }

    /// Timestamp of the most recent `push_sample`.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }

    /// Length-exactly-N copy per channel.
    ///
    /// Fewer than N values are left-padded with the earliest one; a channel
    /// never pushed is N NaN. Context is taken from the latest sample time,
    /// or now when only raw `push` calls were made.
    pub fn snapshot(&self) -> FeatureVector {
        self.snapshot_at(self.last_timestamp.unwrap_or_else(Utc::now))
    }

    /// Snapshot with context computed for `timestamp`.
    pub fn snapshot_at(&self, timestamp: DateTime<Utc>) -> FeatureVector {
        let series = std::array::from_fn(|i| {
            let (front, back) = self.channels[i].as_slices();
            let mut values = Vec::with_capacity(self.channels[i].len());
            values.extend_from_slice(front);
            values.extend_from_slice(back);
            pad_or_slice(&values)
        });
        FeatureVector { series, context: ContextualFeatures::at(timestamp) }
    }
}
