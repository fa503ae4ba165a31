//! Buffer-repeat glitch: freeze the last slice of input and stutter it.

use crate::error::{require_mix, require_positive};
use crate::mix::DryWet;
use crate::Result;
use reel_core::{BlockProcessor, EngineConfig, StreamWriter};
use reel_grain::{GrainEnvelope, GrainPool, GrainScheduler, PeriodicRetrigger, SchedulePolicy};

/// Edge fades on each repeat, as a fraction of the repeat length.
const REPEAT_EDGE: f32 = 0.02;
const REPEAT_VOICES: usize = 4;

/// Stutters the most recent slice while engaged, dry otherwise.
///
/// `engage` copies the latest `slice_ms` of input into a private slice buffer,
/// so however long the effect stays engaged the repeated audio never goes
/// stale.
#[derive(Debug)]
pub struct BufferRepeat {
    input: StreamWriter,
    slice: StreamWriter,
    scratch: Vec<f32>,
    scheduler: GrainScheduler,
    mix: DryWet,
    level: f32,
    slice_samples: usize,
    max_slice_samples: usize,
    sample_rate: f64,
    engaged: bool,
}

impl BufferRepeat {
    /// `slice_ms` is also the longest slice this instance will accept.
    pub fn new(sample_rate: f64, slice_ms: f64, repeat_speed: f64, mix: f32) -> Result<Self> {
        let sample_rate = require_positive("sample_rate", sample_rate)?;
        let slice_ms = require_positive("slice_ms", slice_ms)?;
        let repeat_speed = require_positive("repeat_speed", repeat_speed)?;
        let level = require_mix(mix)?;

        let slice_samples = ((slice_ms * sample_rate / 1000.0).round() as usize).max(1);
        let input = StreamWriter::with_capacity(slice_samples + EngineConfig::MAX_BLOCK_SIZE)?;
        let slice = StreamWriter::with_capacity(slice_samples)?;

        let envelope = GrainEnvelope::new(REPEAT_EDGE, REPEAT_EDGE)?;
        let pool = GrainPool::new(REPEAT_VOICES, envelope, 32)?;
        let mut scheduler = GrainScheduler::new(pool, sample_rate);
        scheduler.set_policy(SchedulePolicy::Periodic(PeriodicRetrigger::new(
            slice_samples as u32,
            repeat_speed,
        )));
        tracing::debug!("Created buffer repeat: slice {} samples", slice_samples);

        Ok(Self {
            input,
            slice,
            scratch: vec![0.0; slice_samples],
            scheduler,
            mix: DryWet::new(0.0),
            level,
            slice_samples,
            max_slice_samples: slice_samples,
            sample_rate,
            engaged: false,
        })
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Capture the latest slice and start repeating it from the next block.
    pub fn engage(&mut self) {
        let scratch = &mut self.scratch[..self.slice_samples];
        self.input.ring().copy_latest(scratch);
        self.slice.reset();
        self.slice.push_block(scratch);

        if let SchedulePolicy::Periodic(periodic) = self.scheduler.policy_mut() {
            periodic.set_slice_samples(self.slice_samples as u32);
        }
        self.scheduler.start();
        self.scheduler.capture(self.slice.ring());
        self.mix.set_mix(self.level);
        self.engaged = true;
    }

    /// Stop repeating; the last repeat fades out and the dry signal returns
    /// over one block.
    pub fn disengage(&mut self) {
        self.scheduler.release();
        self.mix.set_mix(0.0);
        self.engaged = false;
    }

    pub fn slice_ms(&self) -> f64 {
        self.slice_samples as f64 * 1000.0 / self.sample_rate
    }

    /// Takes effect at the next [`engage`](Self::engage). Clamped to the
    /// length given at construction.
    pub fn set_slice_ms(&mut self, ms: f64) {
        let samples = if ms.is_finite() {
            (ms * self.sample_rate / 1000.0).round().max(1.0) as usize
        } else {
            self.max_slice_samples
        };
        self.slice_samples = samples.min(self.max_slice_samples);
    }

    pub fn set_repeat_speed(&mut self, speed: f64) {
        if let SchedulePolicy::Periodic(periodic) = self.scheduler.policy_mut() {
            periodic.set_repeat_speed(speed);
        }
    }

    pub fn repeat_speed(&self) -> f64 {
        match self.scheduler.policy() {
            SchedulePolicy::Periodic(periodic) => periodic.repeat_speed(),
            _ => 1.0,
        }
    }

    /// Wet level while engaged.
    pub fn set_mix(&mut self, mix: f32) {
        self.level = mix.clamp(0.0, 1.0);
        if self.engaged {
            self.mix.set_mix(self.level);
        }
    }
}

impl BlockProcessor for BufferRepeat {
    fn push_block(&mut self, input: &[f32]) {
        self.input.push_block(input);
    }

    fn produce_block(&mut self, out: &mut [f32]) {
        let Self {
            input,
            slice,
            scheduler,
            mix,
            ..
        } = self;
        input.ring().copy_latest(out);
        let slice_ring = slice.ring();
        mix.process(out, |wet| scheduler.tick_mono(slice_ring, wet));
    }

    fn reset(&mut self) {
        self.input.reset();
        self.slice.reset();
        self.scheduler.reset();
        self.engaged = false;
        self.mix.set_mix(0.0);
        self.mix.reset();
    }
}
