//! Grain scheduling policies and the parameter set they are configured from.

mod periodic;
mod scatter;

pub use periodic::PeriodicRetrigger;
pub use scatter::{RandomScatter, ScatterParams};

use crate::pool::GrainPool;
use reel_core::RingBuffer;
use std::ops::Range;

/// How far apart successive grains start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spacing {
    /// Fixed hop between grain starts.
    Hop { ms: f64 },
    /// Uniformly random interval between grain starts.
    Random { min_ms: f64, max_ms: f64 },
}

impl Spacing {
    /// `(min, max)` interval in milliseconds.
    pub fn range_ms(&self) -> (f64, f64) {
        match *self {
            Spacing::Hop { ms } => (ms, ms),
            Spacing::Random { min_ms, max_ms } => (min_ms.min(max_ms), min_ms.max(max_ms)),
        }
    }

    pub fn mean_ms(&self) -> f64 {
        let (min, max) = self.range_ms();
        (min + max) * 0.5
    }
}

/// Grain parameters published from the control thread as one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainParams {
    pub length_ms: f64,
    pub spacing: Spacing,
    /// Distance behind the write head that manual triggers read from.
    pub source_offset_ms: f64,
    pub playback_rate: f64,
    pub gain: f32,
    pub pan: f32,
}

impl Default for GrainParams {
    fn default() -> Self {
        Self {
            length_ms: 80.0,
            spacing: Spacing::Hop { ms: 40.0 },
            source_offset_ms: 100.0,
            playback_rate: 1.0,
            gain: 1.0,
            pan: 0.0,
        }
    }
}

/// Milliseconds to whole samples, never below one.
pub(crate) fn ms_to_samples(ms: f64, sample_rate: f64) -> u32 {
    let samples = (ms * sample_rate / 1000.0).round();
    if samples.is_finite() && samples >= 1.0 {
        samples.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// What, if anything, starts grains on its own.
#[derive(Debug, Clone, Default)]
pub enum SchedulePolicy {
    /// Only explicit triggers start grains.
    #[default]
    Manual,
    Periodic(PeriodicRetrigger),
    Scatter(RandomScatter),
}

impl SchedulePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulePolicy::Manual => "manual",
            SchedulePolicy::Periodic(_) => "periodic",
            SchedulePolicy::Scatter(_) => "scatter",
        }
    }

    /// Samples until this policy next starts a grain, if it will.
    fn countdown(&self) -> Option<u32> {
        match self {
            SchedulePolicy::Manual => None,
            SchedulePolicy::Periodic(periodic) => periodic.countdown(),
            SchedulePolicy::Scatter(scatter) => scatter.countdown(),
        }
    }

    fn elapse(&mut self, samples: u32) {
        match self {
            SchedulePolicy::Manual => {}
            SchedulePolicy::Periodic(periodic) => periodic.elapse(samples),
            SchedulePolicy::Scatter(scatter) => scatter.elapse(samples),
        }
    }

    fn fire(&mut self, ring: &RingBuffer, pool: &mut GrainPool) {
        match self {
            SchedulePolicy::Manual => {}
            SchedulePolicy::Periodic(periodic) => periodic.fire(ring, pool),
            SchedulePolicy::Scatter(scatter) => scatter.fire(ring, pool),
        }
    }

    /// Walk a block of `len` samples, splitting it at every grain start.
    ///
    /// `render` is called for each segment in order; grains started at a
    /// split begin exactly at the next segment's first sample.
    pub(crate) fn run_block(
        &mut self,
        ring: &RingBuffer,
        pool: &mut GrainPool,
        len: usize,
        mut render: impl FnMut(&mut GrainPool, Range<usize>),
    ) {
        let mut start = 0;
        while start < len {
            let remaining = (len - start).min(u32::MAX as usize) as u32;
            match self.countdown() {
                Some(0) => self.fire(ring, pool),
                Some(until) if until < remaining => {
                    let end = start + until as usize;
                    render(pool, start..end);
                    self.elapse(until);
                    start = end;
                }
                _ => {
                    let end = start + remaining as usize;
                    render(pool, start..end);
                    self.elapse(remaining);
                    start = end;
                }
            }
        }
    }

    /// Carry new grain parameters into the policy.
    ///
    /// A periodic policy takes only rate and gain. Its slice and repeat speed
    /// belong to the policy and change only when a new one is installed.
    pub(crate) fn apply_params(&mut self, params: &GrainParams, sample_rate: f64) {
        match self {
            SchedulePolicy::Manual => {}
            SchedulePolicy::Periodic(periodic) => {
                periodic.set_rate(params.playback_rate);
                periodic.set_gain(params.gain);
            }
            SchedulePolicy::Scatter(scatter) => {
                let (min, max) = params.spacing.range_ms();
                scatter.set_interval_samples(
                    ms_to_samples(min, sample_rate),
                    ms_to_samples(max, sample_rate),
                );
                scatter.set_length_center(ms_to_samples(params.length_ms, sample_rate));
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        match self {
            SchedulePolicy::Manual => {}
            SchedulePolicy::Periodic(periodic) => periodic.reset(),
            SchedulePolicy::Scatter(scatter) => scatter.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_samples() {
        assert_eq!(ms_to_samples(10.0, 48000.0), 480);
        assert_eq!(ms_to_samples(0.0, 48000.0), 1);
        assert_eq!(ms_to_samples(f64::NAN, 48000.0), 1);
    }

    #[test]
    fn test_spacing_range_is_ordered() {
        assert_eq!(Spacing::Hop { ms: 5.0 }.range_ms(), (5.0, 5.0));
        let reversed = Spacing::Random {
            min_ms: 30.0,
            max_ms: 10.0,
        };
        assert_eq!(reversed.range_ms(), (10.0, 30.0));
        assert_eq!(reversed.mean_ms(), 20.0);
    }
}
