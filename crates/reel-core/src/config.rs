//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration knobs shared by the engine and its use-case units.
///
/// Everything here is fixed at construction. Changing capacity would
/// invalidate every outstanding cursor, so there is no resize path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz (default: 44100.0)
    pub sample_rate: f64,
    /// Host callback size in samples (default: 1024)
    pub block_size: usize,
    /// History kept in the ring buffer, in seconds (default: 4.0)
    pub max_history_seconds: f64,
    /// Concurrent grains (default: 16)
    pub max_grains: usize,
    /// Grain envelope attack as a fraction of grain length (default: 0.25)
    pub attack_fraction: f32,
    /// Grain envelope release as a fraction of grain length (default: 0.25)
    pub release_fraction: f32,
    /// Fade applied to a grain stolen from a full pool (default: 64)
    pub steal_fade_samples: u32,
    /// Seed for randomized grain scatter (default: 0x5EED)
    pub seed: u64,
    /// Control command queue size (default: 64)
    pub command_capacity: usize,
    /// Resampling readers summed into the output (default: 1)
    pub readers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 1024,
            max_history_seconds: 4.0,
            max_grains: 16,
            attack_fraction: 0.25,
            release_fraction: 0.25,
            steal_fade_samples: 64,
            seed: 0x5EED,
            command_capacity: 64,
            readers: 1,
        }
    }
}

impl EngineConfig {
    pub const MIN_SAMPLE_RATE: f64 = 8000.0;
    pub const MAX_SAMPLE_RATE: f64 = 384000.0;
    pub const MAX_BLOCK_SIZE: usize = 16384;
    pub const MAX_GRAINS: usize = 256;
    pub const MAX_READERS: usize = 16;

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_SAMPLE_RATE..=Self::MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 || self.block_size > Self::MAX_BLOCK_SIZE {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        if !self.max_history_seconds.is_finite() || self.max_history_seconds <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_history_seconds {} must be positive",
                self.max_history_seconds
            )));
        }
        let capacity = self.capacity_samples();
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        if self.max_grains == 0 || self.max_grains > Self::MAX_GRAINS {
            return Err(Error::InvalidConfig(format!(
                "max_grains {} out of range (1-{})",
                self.max_grains,
                Self::MAX_GRAINS
            )));
        }
        let fractions_ok = (0.0..=1.0).contains(&self.attack_fraction)
            && (0.0..=1.0).contains(&self.release_fraction)
            && self.attack_fraction + self.release_fraction <= 1.0;
        if !fractions_ok {
            return Err(Error::InvalidConfig(format!(
                "envelope fractions attack={} release={} must be in 0..=1 and sum to at most 1",
                self.attack_fraction, self.release_fraction
            )));
        }
        if self.command_capacity == 0 {
            return Err(Error::InvalidConfig(
                "command_capacity must be at least 1".into(),
            ));
        }
        if self.readers > Self::MAX_READERS {
            return Err(Error::InvalidConfig(format!(
                "readers {} out of range (0-{})",
                self.readers,
                Self::MAX_READERS
            )));
        }
        Ok(())
    }

    /// Ring buffer capacity in samples.
    pub fn capacity_samples(&self) -> usize {
        self.seconds_to_samples(self.max_history_seconds)
    }

    pub fn seconds_to_samples(&self, seconds: f64) -> usize {
        (seconds.max(0.0) * self.sample_rate).ceil() as usize
    }

    pub fn ms_to_samples(&self, ms: f64) -> usize {
        self.seconds_to_samples(ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.block_size, 1024);
        assert_eq!(config.max_grains, 16);
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity_samples(), 176400);
    }

    #[test]
    fn test_conversions() {
        let config = EngineConfig {
            sample_rate: 48000.0,
            ..Default::default()
        };
        assert_eq!(config.ms_to_samples(10.0), 480);
        assert_eq!(config.seconds_to_samples(0.5), 24000);
        assert_eq!(config.ms_to_samples(-5.0), 0);
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let config = EngineConfig {
            sample_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidSampleRate(0.0)));
    }

    #[test]
    fn test_rejects_bad_block_size() {
        let config = EngineConfig {
            block_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidBlockSize(0)));
    }

    #[test]
    fn test_rejects_non_positive_history() {
        for seconds in [0.0, -1.0, f64::NAN] {
            let config = EngineConfig {
                max_history_seconds: seconds,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_rejects_overlapping_envelope() {
        let config = EngineConfig {
            attack_fraction: 0.7,
            release_fraction: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "sample_rate": 48000.0, "max_grains": 8 }"#).unwrap();
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.max_grains, 8);
        assert_eq!(config.block_size, 1024);
        assert!(config.validate().is_ok());
    }
}
