//! Fixed-statistics feature normalization.
//!
//! Each of the 6 model channels is z-scored with (mean, std) established
//! offline from the training archive. Unlike an online normalizer these stats
//! never move, so a given checkpoint always sees inputs on the scale it was
//! trained on.

use crate::config::{ChannelStats, NormalizationConfig};
use crate::features::FeatureVector;
use crate::types::{Channel, NUM_CHANNELS};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNormalizer {
    channels: [ChannelStats; NUM_CHANNELS],
    kp: ChannelStats,
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new(&NormalizationConfig::default())
    }
}

impl FeatureNormalizer {
    pub fn new(config: &NormalizationConfig) -> Self {
        let mut channels = [ChannelStats::new(0.0, 1.0); NUM_CHANNELS];
        channels[Channel::Speed.index()] = config.speed;
        channels[Channel::Density.index()] = config.density;
        channels[Channel::Bz.index()] = config.bz;
        channels[Channel::Bt.index()] = config.bt;
        channels[Channel::Coupling.index()] = config.coupling;
        channels[Channel::AlfvenVelocity.index()] = config.alfven_velocity;
        Self { channels, kp: config.kp }
    }

    pub fn stats(&self, channel: Channel) -> ChannelStats {
        self.channels[channel.index()]
    }

    pub fn normalize(&self, channel: Channel, value: f64) -> f64 {
        let s = self.stats(channel);
        (value - s.mean) / s.std
    }

    pub fn denormalize(&self, channel: Channel, z: f64) -> f64 {
        let s = self.stats(channel);
        z * s.std + s.mean
    }

    pub fn normalize_kp(&self, kp: f64) -> f64 {
        (kp - self.kp.mean) / self.kp.std
    }

    pub fn denormalize_kp(&self, z: f64) -> f64 {
        z * self.kp.std + self.kp.mean
    }

    /// Time-major normalized rows ready for the sequence model.
    ///
    /// Non-finite values are imputed to 0 (the channel mean). Data quality
    /// must be assessed on the raw vector before calling this.
    pub fn normalize_vector(&self, features: &FeatureVector) -> Vec<[f64; NUM_CHANNELS]> {
        features
            .as_rows()
            .into_iter()
            .map(|row| {
                let mut out = [0.0; NUM_CHANNELS];
                for (ch, value) in Channel::ALL.iter().zip(row) {
                    let z = self.normalize(*ch, value);
                    out[ch.index()] = if z.is_finite() { z } else { 0.0 };
                }
                out
            })
            .collect()
    }
}
