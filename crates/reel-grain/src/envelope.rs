//! Attack/hold/release amplitude shape for grains.

use crate::{Error, Result};

/// Linear ramp up over `attack` of the grain, unity in the middle, linear ramp
/// down over `release`.
///
/// Both endpoints are exactly zero for any length: `amplitude_at(0, L) == 0`
/// and `amplitude_at(L, L) == 0`. That is what keeps grain starts and ends
/// free of clicks, so a zero attack or release still yields a zero first or
/// last sample rather than a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainEnvelope {
    attack: f32,
    release: f32,
}

impl GrainEnvelope {
    pub fn new(attack_fraction: f32, release_fraction: f32) -> Result<Self> {
        let valid = (0.0..=1.0).contains(&attack_fraction)
            && (0.0..=1.0).contains(&release_fraction)
            && attack_fraction + release_fraction <= 1.0;
        if !valid {
            return Err(Error::InvalidEnvelope {
                attack: attack_fraction,
                release: release_fraction,
            });
        }
        Ok(Self {
            attack: attack_fraction,
            release: release_fraction,
        })
    }

    /// Symmetric triangle: ramps up over the first half, down over the second.
    pub const fn triangle() -> Self {
        Self {
            attack: 0.5,
            release: 0.5,
        }
    }

    pub fn attack_fraction(&self) -> f32 {
        self.attack
    }

    pub fn release_fraction(&self) -> f32 {
        self.release
    }

    /// Samples at the end of a grain of `length` spent in the release ramp.
    pub fn release_samples(&self, length: u32) -> u32 {
        (self.release * length as f32).ceil() as u32
    }

    /// Gain in `[0, 1]` after `elapsed` of `length` samples.
    #[inline]
    pub fn amplitude_at(&self, elapsed: u32, length: u32) -> f32 {
        if elapsed == 0 || elapsed >= length {
            return 0.0;
        }
        let elapsed = elapsed as f32;
        let length = length as f32;

        let attack_len = self.attack * length;
        if elapsed < attack_len {
            return elapsed / attack_len;
        }

        let release_len = self.release * length;
        let remaining = length - elapsed;
        if remaining < release_len {
            return remaining / release_len;
        }

        1.0
    }
}

impl Default for GrainEnvelope {
    fn default() -> Self {
        Self {
            attack: 0.25,
            release: 0.25,
        }
    }
}
