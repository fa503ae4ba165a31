//! Stutter / buffer-repeat scheduling: replay one captured slice every hop.

use crate::grain::GrainSpec;
use crate::pool::GrainPool;
use reel_core::{Rate, RingBuffer, MAX_RATE, MIN_RATE};

/// Retriggers the most recently captured slice at a fixed period.
///
/// `hop = slice_samples / repeat_speed`, so a speed of 2 repeats the slice
/// twice as often as its own length and each repeat is cut to the hop.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicRetrigger {
    slice_samples: u32,
    repeat_speed: f64,
    rate: Rate,
    gain: f32,
    /// Absolute stream index of the captured slice start.
    slice_start: Option<i64>,
    /// Samples from the start of the next block to the next trigger.
    countdown: u32,
}

impl PeriodicRetrigger {
    pub fn new(slice_samples: u32, repeat_speed: f64) -> Self {
        Self {
            slice_samples: slice_samples.max(1),
            repeat_speed: clamp_speed(repeat_speed),
            rate: Rate::UNITY,
            gain: 1.0,
            slice_start: None,
            countdown: 0,
        }
    }

    pub fn slice_samples(&self) -> u32 {
        self.slice_samples
    }

    pub fn set_slice_samples(&mut self, samples: u32) {
        self.slice_samples = samples.max(1);
    }

    pub fn repeat_speed(&self) -> f64 {
        self.repeat_speed
    }

    pub fn set_repeat_speed(&mut self, speed: f64) {
        self.repeat_speed = clamp_speed(speed);
    }

    /// Set the hop directly; stored as the equivalent repeat speed.
    pub fn set_hop_samples(&mut self, hop: u32) {
        self.repeat_speed = clamp_speed(self.slice_samples as f64 / hop.max(1) as f64);
    }

    pub fn hop_samples(&self) -> u32 {
        let hop = (self.slice_samples as f64 / self.repeat_speed).round();
        (hop as u32).max(1)
    }

    /// Each repeat lasts the slice or the hop, whichever is shorter.
    pub fn grain_length(&self) -> u32 {
        self.slice_samples.min(self.hop_samples())
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn set_rate(&mut self, rate: impl Into<Rate>) {
        self.rate = rate.into();
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Freeze the latest `slice_samples` of input as the slice to repeat. The
    /// first repeat starts with the next block.
    pub fn capture(&mut self, ring: &RingBuffer) {
        let total = ring.total_written() as i64;
        self.slice_start = Some(total - self.slice_samples as i64);
        self.countdown = 0;
    }

    pub fn is_captured(&self) -> bool {
        self.slice_start.is_some()
    }

    /// Stop repeating. Grains already started play out.
    pub fn release(&mut self) {
        self.slice_start = None;
    }

    pub fn reset(&mut self) {
        self.slice_start = None;
        self.countdown = 0;
    }

    /// Samples until the next repeat, or `None` when nothing is captured.
    pub(crate) fn countdown(&self) -> Option<u32> {
        self.slice_start.map(|_| self.countdown)
    }

    pub(crate) fn elapse(&mut self, samples: u32) {
        self.countdown = self.countdown.saturating_sub(samples);
    }

    /// Start one repeat of the captured slice now.
    pub(crate) fn fire(&mut self, ring: &RingBuffer, pool: &mut GrainPool) {
        let Some(start) = self.slice_start else {
            return;
        };
        if ring.is_stale(start) {
            pool.note_stale();
        }
        let position = ring.slot_of(start) as f64;
        pool.trigger_at(GrainSpec::new(position, self.grain_length(), self.rate).gain(self.gain));
        self.countdown = self.hop_samples();
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.abs().clamp(MIN_RATE, MAX_RATE)
    } else {
        1.0
    }
}
