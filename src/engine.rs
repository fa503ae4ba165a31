//! The audio-thread half of the engine.

use crate::handle::{Command, Shared};
use crate::stats::StatsSnapshot;
use crate::{EngineBuilder, Result};
use crossbeam_channel::Receiver;
use reel_core::{
    BlockProcessor, EngineConfig, GainRamp, Rate, ResamplingReader, RingBuffer, StreamWriter,
};
use reel_grain::{GrainScheduler, PoolStats};
use std::sync::Arc;

#[derive(Debug)]
struct ReaderSlot {
    reader: ResamplingReader,
    gain: GainRamp,
}

/// Ring buffer, resampling readers and grain scheduler driven by the host
/// callback.
///
/// Lives on the audio thread. Each block it drains pending commands, picks up
/// the latest rates, gains and grain parameters, then sums every reader and
/// every sounding grain into the output. Nothing in the block path allocates,
/// locks or logs.
///
/// # Example
///
/// ```
/// use reel::prelude::*;
///
/// let (mut engine, handle) = Engine::builder()
///     .sample_rate(48000.0)
///     .block_size(256)
///     .build()?;
///
/// handle.set_rate(0, 0.5)?;
///
/// let input = [0.0f32; 256];
/// let mut output = [0.0f32; 256];
/// engine.process_block(&input, &mut output);
/// # Ok::<(), reel::Error>(())
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    writer: StreamWriter,
    readers: Vec<ReaderSlot>,
    scheduler: GrainScheduler,
    commands: Receiver<Command>,
    shared: Arc<Shared>,
    output: GainRamp,
    scratch: Vec<f32>,
    last_pool: PoolStats,
    stopped: bool,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn new(
        config: EngineConfig,
        commands: Receiver<Command>,
        shared: Arc<Shared>,
    ) -> Result<Self> {
        let writer = StreamWriter::with_capacity(config.capacity_samples())?;
        let scheduler = GrainScheduler::from_config(&config)?;
        let readers = (0..config.readers)
            .map(|_| ReaderSlot {
                reader: ResamplingReader::new(Rate::UNITY),
                gain: GainRamp::new(1.0),
            })
            .collect();

        Ok(Self {
            scratch: vec![0.0; config.block_size],
            config,
            writer,
            readers,
            scheduler,
            commands,
            shared,
            output: GainRamp::new(1.0),
            last_pool: PoolStats::default(),
            stopped: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn ring(&self) -> &RingBuffer {
        self.writer.ring()
    }

    /// Shared read access to the history for readers on other threads.
    pub fn share_ring(&self) -> Arc<RingBuffer> {
        self.writer.share()
    }

    pub fn scheduler(&self) -> &GrainScheduler {
        &self.scheduler
    }

    pub fn reader(&self, index: usize) -> Option<&ResamplingReader> {
        self.readers.get(index).map(|slot| &slot.reader)
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stereo output: readers are centred, grains are panned. Only
    /// `min(left.len(), right.len())` samples are produced.
    pub fn produce_block_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);
        self.begin_block();
        self.render_readers(left);
        right.copy_from_slice(left);
        self.scheduler.mix_stereo(self.writer.ring(), left, right);

        let mut output = self.output;
        output.apply(left);
        self.output.apply(right);
        self.end_block();
    }

    pub fn process_block_stereo(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        self.push_block(input);
        self.produce_block_stereo(left, right);
    }

    fn begin_block(&mut self) {
        // Parameters first, so a trigger queued after a parameter change
        // already uses the new values.
        let params = **self.shared.params.load();
        self.scheduler.set_params(params);

        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }

        let live = !self.stopped;
        for (index, slot) in self.readers.iter_mut().enumerate() {
            slot.reader.set_rate(self.shared.rates[index].get() as f64);
            slot.reader.set_frozen(self.shared.frozen[index].get());
            let gain = if live {
                self.shared.reader_gains[index].get()
            } else {
                0.0
            };
            slot.gain.set_target(gain);
        }
        self.output.set_target(self.shared.gain.get());
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetMode { reader, mode } => {
                if let Some(slot) = self.readers.get_mut(reader) {
                    slot.reader.set_mode(mode);
                }
            }
            Command::Seek {
                reader,
                samples_behind,
            } => {
                if let Some(slot) = self.readers.get_mut(reader) {
                    slot.reader.start_behind(self.writer.ring(), samples_behind);
                }
            }
            Command::SetPolicy(policy) => self.scheduler.set_policy(policy),
            // A stopped engine stays silent until `Start`.
            Command::Trigger | Command::TriggerWith { .. } | Command::Capture
                if self.stopped => {}
            Command::Trigger => {
                self.scheduler.trigger(self.writer.ring());
            }
            Command::TriggerWith {
                source_offset,
                length,
                rate,
            } => {
                self.scheduler
                    .trigger_with(self.writer.ring(), source_offset, length, rate);
            }
            Command::Release => self.scheduler.release(),
            Command::Capture => self.scheduler.capture(self.writer.ring()),
            Command::Stop => {
                self.stopped = true;
                self.scheduler.stop();
            }
            Command::Start => {
                self.stopped = false;
                self.scheduler.start();
            }
            Command::Reset => self.reset(),
        }
    }

    /// Overwrite `out` with the sum of all readers.
    fn render_readers(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let ring = self.writer.ring();
        if out.len() <= self.scratch.len() {
            let scratch = &mut self.scratch[..out.len()];
            for slot in &mut self.readers {
                slot.reader.produce_block(ring, scratch);
                slot.gain.apply(scratch);
                for (sample, read) in out.iter_mut().zip(scratch.iter()) {
                    *sample += *read;
                }
            }
        } else {
            // Longer than the configured block: no scratch to ramp in, so
            // gains jump to their targets.
            for slot in &mut self.readers {
                let gain = slot.gain.target();
                slot.gain.reset(gain);
                slot.reader.mix_block(ring, out, gain);
            }
        }
    }

    fn end_block(&mut self) {
        self.shared.stats.blocks.incr();
        self.sync_pool_stats();
    }

    fn sync_pool_stats(&mut self) {
        let now = self.scheduler.stats();
        self.shared.stats.absorb_pool(&self.last_pool, &now);
        self.last_pool = now;
    }
}

impl BlockProcessor for Engine {
    fn push_block(&mut self, input: &[f32]) {
        self.writer.push_block(input);
    }

    fn produce_block(&mut self, out: &mut [f32]) {
        self.begin_block();
        self.render_readers(out);
        self.scheduler.mix_mono(self.writer.ring(), out);
        self.output.apply(out);
        self.end_block();
    }

    /// Clear the history, retire every grain, rewind readers and policy and
    /// resume from a stop. Rates, gains, modes and grain parameters are kept.
    fn reset(&mut self) {
        self.sync_pool_stats();
        self.writer.reset();
        for (index, slot) in self.readers.iter_mut().enumerate() {
            slot.reader.set_position(0.0);
            slot.gain.reset(self.shared.reader_gains[index].get());
        }
        self.scheduler.reset();
        self.last_pool = PoolStats::default();
        self.output.reset(self.shared.gain.get());
        self.stopped = false;
    }
}
