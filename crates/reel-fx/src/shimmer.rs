//! Granular shimmer: a random grain cloud over the live input.

use crate::error::{require_mix, require_positive};
use crate::mix::DryWet;
use crate::Result;
use reel_core::{BlockProcessor, EngineConfig, StreamWriter};
use reel_grain::{
    GrainEnvelope, GrainPool, GrainScheduler, RandomScatter, ScatterParams, SchedulePolicy,
};

/// Scatters pitched, panned grains from up to `offset_ms.1` of recent input
/// over the dry signal. Identical seeds and input give identical output.
#[derive(Debug)]
pub struct Shimmer {
    writer: StreamWriter,
    scheduler: GrainScheduler,
    mix: DryWet,
}

impl Shimmer {
    pub fn new(
        sample_rate: f64,
        params: ScatterParams,
        mix: f32,
        seed: u64,
        max_grains: usize,
    ) -> Result<Self> {
        let sample_rate = require_positive("sample_rate", sample_rate)?;
        let mix = require_mix(mix)?;
        let scatter = RandomScatter::new(params, sample_rate, seed)?;

        // Enough history for the furthest offset plus the longest grain at
        // the highest pitch.
        let pitch_max = 2f64.powf(params.pitch_semitones.1.max(0.0) / 12.0);
        let history_ms = params.offset_ms.1 + params.grain_ms.1 * pitch_max;
        let capacity = ((history_ms * sample_rate / 1000.0).ceil() as usize).max(1)
            + EngineConfig::MAX_BLOCK_SIZE;
        let writer = StreamWriter::with_capacity(capacity)?;

        let pool = GrainPool::new(max_grains, GrainEnvelope::default(), 64)?;
        let mut scheduler = GrainScheduler::new(pool, sample_rate);
        scheduler.set_policy(SchedulePolicy::Scatter(scatter));
        tracing::debug!(
            "Created shimmer: {} grains over {} samples of history",
            max_grains,
            capacity
        );

        Ok(Self {
            writer,
            scheduler,
            mix: DryWet::new(mix),
        })
    }

    pub fn mix(&self) -> f32 {
        self.mix.mix()
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_mix(mix);
    }

    pub fn scheduler(&self) -> &GrainScheduler {
        &self.scheduler
    }

    /// Stop the cloud; grains already sounding fade out.
    pub fn freeze_cloud(&mut self) {
        self.scheduler.stop();
    }

    pub fn resume_cloud(&mut self) {
        self.scheduler.start();
    }

    /// Render the latest input block to both channels with the grains panned.
    pub fn produce_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);
        let ring = self.writer.ring();
        ring.copy_latest(left);
        right.copy_from_slice(left);
        let scheduler = &mut self.scheduler;
        self.mix.process_stereo(left, right, |wet_left, wet_right| {
            scheduler.tick_stereo(ring, wet_left, wet_right)
        });
    }

    pub fn process_stereo(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        self.writer.push_block(input);
        self.produce_stereo(left, right);
    }
}

impl BlockProcessor for Shimmer {
    fn push_block(&mut self, input: &[f32]) {
        self.writer.push_block(input);
    }

    fn produce_block(&mut self, out: &mut [f32]) {
        let ring = self.writer.ring();
        ring.copy_latest(out);
        let scheduler = &mut self.scheduler;
        self.mix.process(out, |wet| scheduler.tick_mono(ring, wet));
    }

    fn reset(&mut self) {
        self.writer.reset();
        self.scheduler.reset();
        self.mix.reset();
    }
}
