//! Reverse delay: every window of input comes back played backwards.

use crate::error::{require_mix, require_positive};
use crate::mix::DryWet;
use crate::Result;
use reel_core::{BlockProcessor, EngineConfig, ReadMode, ResamplingReader, StreamWriter};

/// Plays each `delay_seconds` window of input in reverse during the next
/// window, blended with the dry input.
///
/// Output lags input by at most `2 × delay - 1` samples. Blocks should be
/// produced right after the matching push.
#[derive(Debug)]
pub struct ReverseDelay {
    writer: StreamWriter,
    reader: ResamplingReader,
    mix: DryWet,
    sample_rate: f64,
    max_delay_seconds: f64,
}

impl ReverseDelay {
    /// `delay_seconds` is also the longest delay this instance will accept.
    pub fn new(sample_rate: f64, delay_seconds: f64, mix: f32) -> Result<Self> {
        let sample_rate = require_positive("sample_rate", sample_rate)?;
        let delay_seconds = require_positive("delay_seconds", delay_seconds)?;
        let mix = require_mix(mix)?;

        let slice = (delay_seconds * sample_rate).round().max(1.0);
        let capacity = 2 * slice as usize + EngineConfig::MAX_BLOCK_SIZE;
        let writer = StreamWriter::with_capacity(capacity)?;
        tracing::debug!(
            "Created reverse delay: {} samples per window, capacity {}",
            slice,
            capacity
        );

        Ok(Self {
            writer,
            reader: ResamplingReader::mirrored(slice),
            mix: DryWet::new(mix),
            sample_rate,
            max_delay_seconds: delay_seconds,
        })
    }

    pub fn delay_seconds(&self) -> f64 {
        match self.reader.mode() {
            ReadMode::MirroredSlice { slice_samples } => slice_samples / self.sample_rate,
            ReadMode::Varispeed => 0.0,
        }
    }

    /// Change the window length, clamped to the length given at construction.
    pub fn set_delay_seconds(&mut self, seconds: f64) {
        let seconds = if seconds.is_finite() {
            seconds.clamp(1.0 / self.sample_rate, self.max_delay_seconds)
        } else {
            self.max_delay_seconds
        };
        let slice_samples = (seconds * self.sample_rate).round().max(1.0);
        self.reader.set_mode(ReadMode::MirroredSlice { slice_samples });
    }

    pub fn mix(&self) -> f32 {
        self.mix.mix()
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_mix(mix);
    }
}

impl BlockProcessor for ReverseDelay {
    fn push_block(&mut self, input: &[f32]) {
        self.writer.push_block(input);
    }

    fn produce_block(&mut self, out: &mut [f32]) {
        let Self {
            writer, reader, mix, ..
        } = self;
        let ring = writer.ring();
        ring.copy_latest(out);
        mix.process(out, |wet| reader.produce_block(ring, wet));
    }

    fn reset(&mut self) {
        self.writer.reset();
        self.mix.reset();
    }
}
