//! A single grain and the tail left behind when one is stolen.

use crate::envelope::GrainEnvelope;
use reel_core::{FractionalCursor, Rate, RingBuffer};

/// Equal-power stereo position, `-1.0` hard left to `1.0` hard right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pan {
    left: f32,
    right: f32,
}

impl Pan {
    pub const CENTER: Pan = Pan {
        left: std::f32::consts::FRAC_1_SQRT_2,
        right: std::f32::consts::FRAC_1_SQRT_2,
    };

    pub fn new(position: f32) -> Self {
        let position = if position.is_finite() {
            position.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let angle = (position + 1.0) * std::f32::consts::FRAC_PI_4;
        Self {
            left: angle.cos(),
            right: angle.sin(),
        }
    }

    #[inline]
    pub fn gains(&self) -> (f32, f32) {
        (self.left, self.right)
    }
}

impl Default for Pan {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Everything needed to start a grain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainSpec {
    /// Fractional slot in the ring where playback starts.
    pub position: f64,
    /// Grain length in output samples; 0 is treated as 1.
    pub length: u32,
    pub rate: Rate,
    pub gain: f32,
    pub pan: f32,
    /// Samples into the current block before the grain starts.
    pub start_delay: u32,
}

impl GrainSpec {
    pub fn new(position: f64, length: u32, rate: impl Into<Rate>) -> Self {
        Self {
            position,
            length,
            rate: rate.into(),
            gain: 1.0,
            pan: 0.0,
            start_delay: 0,
        }
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn pan(mut self, pan: f32) -> Self {
        self.pan = pan;
        self
    }

    pub fn start_delay(mut self, samples: u32) -> Self {
        self.start_delay = samples;
        self
    }
}

/// Linear fade multiplier counting down to silence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Fade {
    remaining: u32,
    total: u32,
}

impl Fade {
    fn new(samples: u32) -> Self {
        let samples = samples.max(1);
        Self {
            remaining: samples,
            total: samples,
        }
    }

    #[inline]
    fn next_gain(&mut self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining as f32 / self.total as f32
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.total != 0 && self.remaining == 0
    }
}

/// The outgoing half of a steal: keeps reading where the stolen grain was,
/// fading from its last amplitude to zero.
#[derive(Debug, Clone, Copy, Default)]
struct StolenTail {
    cursor: FractionalCursor,
    amplitude: f32,
    pan: Pan,
    fade: Fade,
    active: bool,
}

impl StolenTail {
    #[inline]
    fn next_sample(&mut self, ring: &RingBuffer) -> f32 {
        let gain = self.amplitude * self.fade.next_gain();
        let sample = self.cursor.next_sample(ring) * gain;
        if self.fade.is_done() {
            self.active = false;
        }
        sample
    }
}

/// One playback instance inside a [`GrainPool`](crate::GrainPool) slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct Grain {
    cursor: FractionalCursor,
    length: u32,
    elapsed: u32,
    delay: u32,
    gain: f32,
    pan: Pan,
    seq: u64,
    active: bool,
    release: Option<Fade>,
    tail: StolenTail,
}

impl Grain {
    pub fn start(&mut self, spec: &GrainSpec, seq: u64) {
        self.cursor = FractionalCursor::new(spec.position, spec.rate);
        self.length = spec.length.max(1);
        self.elapsed = 0;
        self.delay = spec.start_delay;
        self.gain = if spec.gain.is_finite() { spec.gain } else { 0.0 };
        self.pan = Pan::new(spec.pan);
        self.seq = seq;
        self.active = true;
        self.release = None;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Slot still makes sound, either from the grain or from a stolen tail.
    #[inline]
    pub fn is_sounding(&self) -> bool {
        self.active || self.tail.active
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Move this grain into the slot's tail so the slot can host a new one.
    pub fn steal(&mut self, envelope: &GrainEnvelope, fade_samples: u32) {
        if !self.active {
            return;
        }
        let amplitude = if self.delay > 0 {
            0.0
        } else {
            envelope.amplitude_at(self.elapsed, self.length) * self.gain
        };
        self.tail = StolenTail {
            cursor: self.cursor,
            amplitude,
            pan: self.pan,
            fade: Fade::new(fade_samples),
            active: amplitude > 0.0,
        };
        self.active = false;
    }

    /// Start fading out through the release ramp instead of playing to the end.
    pub fn release(&mut self, envelope: &GrainEnvelope) {
        if !self.active || self.release.is_some() {
            return;
        }
        if self.delay > 0 {
            // Never started: nothing to fade.
            self.active = false;
            return;
        }
        let remaining = self.length - self.elapsed;
        let samples = envelope.release_samples(self.length).clamp(1, remaining.max(1));
        self.release = Some(Fade::new(samples));
    }

    pub fn retire(&mut self) {
        self.active = false;
        self.tail.active = false;
        self.release = None;
    }

    /// Next sample of the fading stolen tail, if one is still sounding.
    #[inline]
    pub fn next_tail_sample(&mut self, ring: &RingBuffer) -> Option<(f32, Pan)> {
        if !self.tail.active {
            return None;
        }
        Some((self.tail.next_sample(ring), self.tail.pan))
    }

    /// Next enveloped grain sample, or `None` while idle or waiting to start.
    #[inline]
    pub fn next_grain_sample(
        &mut self,
        ring: &RingBuffer,
        envelope: &GrainEnvelope,
    ) -> Option<(f32, Pan)> {
        if !self.active {
            return None;
        }
        if self.delay > 0 {
            self.delay -= 1;
            return None;
        }

        let mut amp = envelope.amplitude_at(self.elapsed, self.length) * self.gain;
        if let Some(fade) = self.release.as_mut() {
            amp *= fade.next_gain();
        }
        let sample = self.cursor.next_sample(ring) * amp;
        self.elapsed += 1;

        let faded_out = self.release.is_some_and(|fade| fade.is_done());
        if self.elapsed >= self.length || faded_out {
            self.active = false;
        }
        Some((sample, self.pan))
    }
}
