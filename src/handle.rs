//! Control-thread side of the engine.
//!
//! Scalar parameters (rates, gains, freeze flags) are plain atomics read once
//! per block. The multi-field [`GrainParams`] set is swapped as a whole through
//! `ArcSwap`, so a block never sees half an update. Everything else is a
//! [`Command`] on a bounded queue that the audio thread drains with
//! `try_recv` at the start of each block.

use crate::stats::{EngineStats, StatsSnapshot};
use crate::{Error, Result};
use arc_swap::ArcSwap;
use crossbeam_channel::{Sender, TrySendError};
use reel_core::{AtomicFlag, AtomicFloat, Rate, ReadMode, Varispeed};
use reel_grain::{GrainParams, PeriodicRetrigger, RandomScatter, ScatterParams, SchedulePolicy};
use std::sync::Arc;

/// Work the audio thread applies at the next block boundary.
#[derive(Debug)]
pub(crate) enum Command {
    SetMode { reader: usize, mode: ReadMode },
    Seek { reader: usize, samples_behind: f64 },
    SetPolicy(SchedulePolicy),
    Trigger,
    TriggerWith {
        source_offset: usize,
        length: u32,
        rate: f64,
    },
    Release,
    Capture,
    Stop,
    Start,
    Reset,
}

/// State shared between the engine and every handle.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) rates: Vec<AtomicFloat>,
    pub(crate) frozen: Vec<AtomicFlag>,
    pub(crate) reader_gains: Vec<AtomicFloat>,
    pub(crate) gain: AtomicFloat,
    pub(crate) params: ArcSwap<GrainParams>,
    pub(crate) stats: EngineStats,
}

impl Shared {
    pub(crate) fn new(readers: usize, params: GrainParams) -> Self {
        Self {
            rates: (0..readers).map(|_| AtomicFloat::new(1.0)).collect(),
            frozen: (0..readers).map(|_| AtomicFlag::new(false)).collect(),
            reader_gains: (0..readers).map(|_| AtomicFloat::new(1.0)).collect(),
            gain: AtomicFloat::new(1.0),
            params: ArcSwap::from_pointee(params),
            stats: EngineStats::default(),
        }
    }
}

/// Thread-safe remote control for an [`Engine`](crate::Engine).
///
/// Cheap to clone; every clone drives the same engine. Nothing here ever
/// blocks: if the command queue is full the command is dropped, logged and
/// counted in [`StatsSnapshot::commands_dropped`].
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: Sender<Command>,
    shared: Arc<Shared>,
    sample_rate: f64,
    seed: u64,
}

impl EngineHandle {
    pub(crate) fn new(
        commands: Sender<Command>,
        shared: Arc<Shared>,
        sample_rate: f64,
        seed: u64,
    ) -> Self {
        Self {
            commands,
            shared,
            sample_rate,
            seed,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn reader_count(&self) -> usize {
        self.shared.rates.len()
    }

    fn check_reader(&self, index: usize) -> Result<()> {
        let count = self.reader_count();
        if index < count {
            Ok(())
        } else {
            Err(Error::InvalidReader { index, count })
        }
    }

    /// Playback rate of one reader, picked up at the next block. Negative plays
    /// backwards; values outside the playable range are clamped and counted.
    pub fn set_rate(&self, reader: usize, rate: f64) -> Result<()> {
        self.check_reader(reader)?;
        if Rate::needs_clamp(rate) {
            self.shared.stats.clamped_rates.incr();
        }
        self.shared.rates[reader].set(Rate::new(rate).get() as f32);
        Ok(())
    }

    /// Speed and direction as set from a transport-style control.
    pub fn set_varispeed(&self, reader: usize, varispeed: Varispeed) -> Result<()> {
        self.set_rate(reader, varispeed.rate().get())
    }

    pub fn rate(&self, reader: usize) -> Result<f64> {
        self.check_reader(reader)?;
        Ok(self.shared.rates[reader].get() as f64)
    }

    /// Hold a reader on its current sample.
    pub fn set_freeze(&self, reader: usize, frozen: bool) -> Result<()> {
        self.check_reader(reader)?;
        self.shared.frozen[reader].set(frozen);
        Ok(())
    }

    pub fn set_reader_gain(&self, reader: usize, gain: f32) -> Result<()> {
        self.check_reader(reader)?;
        self.shared.reader_gains[reader].set(gain);
        Ok(())
    }

    /// Output gain, ramped over one block.
    pub fn set_gain(&self, gain: f32) {
        self.shared.gain.set(gain);
    }

    pub fn gain(&self) -> f32 {
        self.shared.gain.get()
    }

    pub fn set_mode(&self, reader: usize, mode: ReadMode) -> Result<()> {
        self.check_reader(reader)?;
        self.send(Command::SetMode { reader, mode });
        Ok(())
    }

    /// Jump a reader to `samples_behind` the write head.
    pub fn seek(&self, reader: usize, samples_behind: f64) -> Result<()> {
        self.check_reader(reader)?;
        self.send(Command::Seek {
            reader,
            samples_behind,
        });
        Ok(())
    }

    /// Publish a complete grain parameter set in one atomic swap.
    pub fn set_grain_params(&self, params: GrainParams) {
        self.shared.params.store(Arc::new(params));
    }

    pub fn grain_params(&self) -> GrainParams {
        **self.shared.params.load()
    }

    /// Replace the grain scheduling policy at the next block boundary.
    pub fn set_policy(&self, policy: SchedulePolicy) {
        self.send(Command::SetPolicy(policy));
    }

    /// Switch to a random grain cloud seeded from the engine config.
    pub fn scatter(&self, params: ScatterParams) -> Result<()> {
        let scatter = RandomScatter::new(params, self.sample_rate, self.seed)?;
        self.set_policy(SchedulePolicy::Scatter(scatter));
        Ok(())
    }

    /// Switch to buffer repeat. Nothing plays until [`capture`](Self::capture).
    pub fn periodic(&self, slice_ms: f64, repeat_speed: f64) {
        let slice = (slice_ms * self.sample_rate / 1000.0).round();
        let slice = if slice.is_finite() && slice >= 1.0 {
            slice.min(u32::MAX as f64) as u32
        } else {
            1
        };
        self.set_policy(SchedulePolicy::Periodic(PeriodicRetrigger::new(
            slice,
            repeat_speed,
        )));
    }

    /// Start one grain from the current grain parameters.
    pub fn trigger(&self) {
        self.send(Command::Trigger);
    }

    /// Start one grain `source_offset` samples behind the write head.
    pub fn trigger_with(&self, source_offset: usize, length: u32, rate: f64) {
        self.send(Command::TriggerWith {
            source_offset,
            length,
            rate,
        });
    }

    /// Fade out live grains and stop any buffer repeat.
    pub fn release(&self) {
        self.send(Command::Release);
    }

    /// Freeze the latest slice for buffer repeat.
    pub fn capture(&self) {
        self.send(Command::Capture);
    }

    /// Fade everything out at the next block and go silent until [`start`](Self::start).
    pub fn stop(&self) {
        tracing::debug!("Engine stop requested");
        self.send(Command::Stop);
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    /// Clear history, grains and readers at the next block.
    pub fn reset(&self) {
        tracing::debug!("Engine reset requested");
        self.send(Command::Reset);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    fn send(&self, command: Command) {
        match self.commands.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                self.shared.stats.commands_dropped.incr();
                tracing::warn!("Engine command queue full, dropped {:?}", command);
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Engine dropped, command ignored");
            }
        }
    }
}
