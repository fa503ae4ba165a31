//! Randomised grain cloud over the recent history.

use super::ms_to_samples;
use crate::grain::GrainSpec;
use crate::pool::{min_source_offset, GrainPool};
use crate::{Error, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use reel_core::{Rate, RingBuffer};

/// Ranges for [`RandomScatter`], in musical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterParams {
    /// Time between grain starts.
    pub interval_ms: (f64, f64),
    pub grain_ms: (f64, f64),
    /// How far behind the write head grains may read from.
    pub offset_ms: (f64, f64),
    pub pitch_semitones: (f64, f64),
    /// Pan is drawn from `[-pan_spread, pan_spread]`.
    pub pan_spread: f32,
    pub gain: (f32, f32),
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            interval_ms: (20.0, 60.0),
            grain_ms: (60.0, 140.0),
            offset_ms: (0.0, 1000.0),
            pitch_semitones: (0.0, 0.0),
            pan_spread: 0.5,
            gain: (0.5, 0.8),
        }
    }
}

impl ScatterParams {
    fn validate(&self) -> Result<()> {
        let ranges = [
            ("interval_ms", self.interval_ms),
            ("grain_ms", self.grain_ms),
            ("offset_ms", self.offset_ms),
        ];
        for (name, (min, max)) in ranges {
            if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be a non-negative ascending range, got ({min}, {max})"
                )));
            }
        }
        let (low, high) = self.pitch_semitones;
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(Error::InvalidParameter(format!(
                "pitch_semitones must be ascending, got ({low}, {high})"
            )));
        }
        if !(0.0..=1.0).contains(&self.pan_spread) {
            return Err(Error::InvalidParameter(format!(
                "pan_spread must be within 0..=1, got {}",
                self.pan_spread
            )));
        }
        let (low, high) = self.gain;
        if !(low.is_finite() && high.is_finite()) || low < 0.0 || low > high {
            return Err(Error::InvalidParameter(format!(
                "gain must be a non-negative ascending range, got ({low}, {high})"
            )));
        }
        Ok(())
    }
}

/// Starts grains at random intervals with random length, source offset,
/// pitch, pan and gain. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct RandomScatter {
    interval: (u32, u32),
    length: (u32, u32),
    offset: (u32, u32),
    pitch_semitones: (f64, f64),
    pan_spread: f32,
    gain: (f32, f32),
    seed: u64,
    rng: SmallRng,
    countdown: u32,
}

impl RandomScatter {
    pub fn new(params: ScatterParams, sample_rate: f64, seed: u64) -> Result<Self> {
        params.validate()?;
        let to_samples = |(min, max): (f64, f64)| {
            (ms_to_samples(min, sample_rate), ms_to_samples(max, sample_rate))
        };
        let offset = (
            (params.offset_ms.0 * sample_rate / 1000.0).round() as u32,
            (params.offset_ms.1 * sample_rate / 1000.0).round() as u32,
        );
        Ok(Self {
            interval: to_samples(params.interval_ms),
            length: to_samples(params.grain_ms),
            offset,
            pitch_semitones: params.pitch_semitones,
            pan_spread: params.pan_spread,
            gain: params.gain,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            countdown: 0,
        })
    }

    pub fn interval_samples(&self) -> (u32, u32) {
        self.interval
    }

    pub fn length_samples(&self) -> (u32, u32) {
        self.length
    }

    pub fn set_interval_samples(&mut self, min: u32, max: u32) {
        let min = min.max(1);
        self.interval = (min, max.max(min));
    }

    /// Re-centre the length range on `center`, keeping its relative spread.
    pub fn set_length_center(&mut self, center: u32) {
        let (min, max) = self.length;
        let old_center = (min as f64 + max as f64) * 0.5;
        let spread = if old_center > 0.0 {
            (max as f64 - min as f64) * 0.5 / old_center
        } else {
            0.0
        };
        let center = center.max(1) as f64;
        let min = (center * (1.0 - spread)).round().max(1.0) as u32;
        let max = (center * (1.0 + spread)).round().max(min as f64) as u32;
        self.length = (min, max);
    }

    /// Rewind the random sequence to its seed.
    pub fn reset(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.seed);
        self.countdown = 0;
    }

    /// Samples until the next grain starts.
    pub(crate) fn countdown(&self) -> Option<u32> {
        Some(self.countdown)
    }

    pub(crate) fn elapse(&mut self, samples: u32) {
        self.countdown = self.countdown.saturating_sub(samples);
    }

    /// Start one random grain now and draw the interval to the next.
    pub(crate) fn fire(&mut self, ring: &RingBuffer, pool: &mut GrainPool) {
        let spec = self.next_grain(ring, pool);
        pool.trigger_at(spec);
        self.countdown = self
            .rng
            .gen_range(self.interval.0..=self.interval.1)
            .max(1);
    }

    fn next_grain(&mut self, ring: &RingBuffer, pool: &mut GrainPool) -> GrainSpec {
        let length = self.rng.gen_range(self.length.0..=self.length.1);
        let semitones = self
            .rng
            .gen_range(self.pitch_semitones.0..=self.pitch_semitones.1);
        let rate = Rate::from_semitones(semitones);

        // The window is lifted off the write head so no grain reaches
        // unwritten slots.
        let drawn = self.rng.gen_range(self.offset.0..=self.offset.1) as usize;
        let offset = drawn.max(min_source_offset(length, rate));
        if offset > ring.sample_count_available() {
            pool.note_stale();
        }

        let pan = if self.pan_spread > 0.0 {
            self.rng.gen_range(-self.pan_spread..=self.pan_spread)
        } else {
            0.0
        };
        let gain = self.rng.gen_range(self.gain.0..=self.gain.1);

        GrainSpec::new(ring.position_behind(offset as f64), length, rate)
            .gain(gain)
            .pan(pan)
    }
}
