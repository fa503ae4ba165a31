//! Live pitch shifting with two crossfaded varispeed taps.
//!
//! Each tap is a [`ResamplingReader`] running at `ratio`, so its distance
//! behind the write head drifts by `1 - ratio` samples per output sample. When
//! a tap drifts out of the window it jumps back by exactly one window. The two
//! taps sit half a window apart and their triangular gains always sum to one,
//! so every jump lands where that tap is silent.

use crate::error::{require_mix, require_positive};
use crate::mix::DryWet;
use crate::Result;
use reel_core::{
    wrap_position, BlockProcessor, EngineConfig, Rate, ResamplingReader, RingBuffer, StreamWriter,
};

/// Closest a tap may get to the write head, in samples.
const MIN_LAG: f64 = 2.0;

/// Crossfade gain at `phase` through the window: 0 at the edges, 1 mid-way.
#[inline]
fn triangle(phase: f64) -> f32 {
    (1.0 - (2.0 * phase - 1.0).abs()).max(0.0) as f32
}

#[derive(Debug)]
struct Tap {
    reader: ResamplingReader,
    /// Place within the window, `[0, 1)`. Lag is `MIN_LAG + phase * window`.
    phase: f64,
}

impl Tap {
    fn new(ratio: Rate, phase: f64) -> Self {
        Self {
            reader: ResamplingReader::new(ratio),
            phase,
        }
    }

    /// Add this tap's output for the samples starting at `now` into `out`.
    ///
    /// The reader is re-anchored from the phase at the start of each run and
    /// again after every window jump; in between it advances on its own.
    #[allow(clippy::too_many_arguments)]
    fn render(
        &mut self,
        ring: &RingBuffer,
        now: f64,
        step: f64,
        window: f64,
        out: &mut [f32],
        read: &mut [f32],
        gains: &mut [f32],
    ) {
        let len = out.len();
        let mut start = 0;
        while start < len {
            let lag = MIN_LAG + self.phase * window;
            let position = wrap_position(now + start as f64 - lag, ring.capacity());
            self.reader.set_position(position);

            let mut end = start;
            while end < len {
                gains[end] = triangle(self.phase);
                let next = self.phase + step;
                self.phase = next.rem_euclid(1.0);
                end += 1;
                if !(0.0..1.0).contains(&next) {
                    break;
                }
            }
            self.reader.produce_block(ring, &mut read[start..end]);
            start = end;
        }

        for ((sample, read), gain) in out.iter_mut().zip(read.iter()).zip(gains.iter()) {
            *sample += read * gain;
        }
    }
}

#[derive(Debug)]
pub struct PitchShifter {
    writer: StreamWriter,
    taps: [Tap; 2],
    ratio: Rate,
    /// Window length in samples.
    window: f64,
    read: Vec<f32>,
    gains: Vec<f32>,
    mix: DryWet,
    sample_rate: f64,
}

impl PitchShifter {
    /// `ratio` 2.0 is an octave up, 0.5 an octave down.
    pub fn new(sample_rate: f64, ratio: f64, window_ms: f64, mix: f32) -> Result<Self> {
        let sample_rate = require_positive("sample_rate", sample_rate)?;
        let window_ms = require_positive("window_ms", window_ms)?;
        let ratio = Rate::new(require_positive("ratio", ratio)?);
        let mix = require_mix(mix)?;

        let window = (window_ms * sample_rate / 1000.0).max(1.0);
        let capacity = (MIN_LAG + window).ceil() as usize + EngineConfig::MAX_BLOCK_SIZE + 2;
        let writer = StreamWriter::with_capacity(capacity)?;
        tracing::debug!(
            "Created pitch shifter: ratio {}, window {} samples",
            ratio.get(),
            window
        );

        Ok(Self {
            writer,
            taps: [Tap::new(ratio, 0.0), Tap::new(ratio, 0.5)],
            ratio,
            window,
            read: vec![0.0; EngineConfig::MAX_BLOCK_SIZE],
            gains: vec![0.0; EngineConfig::MAX_BLOCK_SIZE],
            mix: DryWet::new(mix),
            sample_rate,
        })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio.get()
    }

    /// Clamped to the positive rate range.
    pub fn set_ratio(&mut self, ratio: f64) {
        self.apply_ratio(Rate::new(ratio.abs()));
    }

    pub fn set_semitones(&mut self, semitones: f64) {
        self.apply_ratio(Rate::from_semitones(semitones));
    }

    fn apply_ratio(&mut self, ratio: Rate) {
        self.ratio = ratio;
        for tap in &mut self.taps {
            tap.reader.set_rate(ratio);
        }
    }

    pub fn window_ms(&self) -> f64 {
        self.window * 1000.0 / self.sample_rate
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_mix(mix);
    }

    /// Latency of the wet path at unity ratio, in samples.
    pub fn latency_samples(&self) -> f64 {
        MIN_LAG + self.window * 0.5
    }
}

impl BlockProcessor for PitchShifter {
    fn push_block(&mut self, input: &[f32]) {
        self.writer.push_block(input);
    }

    fn produce_block(&mut self, out: &mut [f32]) {
        let Self {
            writer,
            taps,
            ratio,
            window,
            read,
            gains,
            mix,
            ..
        } = self;
        let ring = writer.ring();
        ring.copy_latest(out);

        let block_start = ring.write_index() as f64 - out.len() as f64;
        let step = (1.0 - ratio.get()) / *window;
        let mut rendered = 0usize;
        mix.process(out, |wet| {
            let len = wet.len();
            let now = block_start + rendered as f64;
            wet.fill(0.0);
            for tap in taps.iter_mut() {
                tap.render(
                    ring,
                    now,
                    step,
                    *window,
                    wet,
                    &mut read[..len],
                    &mut gains[..len],
                );
            }
            rendered += len;
        });
    }

    fn reset(&mut self) {
        self.writer.reset();
        self.taps[0].phase = 0.0;
        self.taps[1].phase = 0.5;
        self.mix.reset();
    }
}
