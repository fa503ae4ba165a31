//! Builder for configuring and constructing an [`Engine`].

use crate::handle::{EngineHandle, Shared};
use crate::{Engine, Result};
use reel_core::EngineConfig;
use reel_grain::GrainParams;
use std::sync::Arc;

/// Every knob defaults to [`EngineConfig::default`]. `build` validates the
/// whole configuration and allocates everything the audio thread will ever
/// need.
///
/// # Example
///
/// ```
/// use reel::prelude::*;
///
/// let (engine, handle) = Engine::builder()
///     .sample_rate(48000.0)
///     .block_size(512)
///     .max_history_seconds(2.0)
///     .max_grains(32)
///     .readers(2)
///     .build()?;
///
/// assert_eq!(engine.ring().capacity(), 96000);
/// assert_eq!(handle.reader_count(), 2);
/// # Ok::<(), reel::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Start from a complete configuration, e.g. one loaded with serde.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 44100.0
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 1024
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    /// Default: 4.0
    pub fn max_history_seconds(mut self, seconds: f64) -> Self {
        self.config.max_history_seconds = seconds;
        self
    }

    /// Default: 16
    pub fn max_grains(mut self, count: usize) -> Self {
        self.config.max_grains = count;
        self
    }

    /// Grain attack and release as fractions of grain length. Default: 0.25 each
    pub fn envelope(mut self, attack_fraction: f32, release_fraction: f32) -> Self {
        self.config.attack_fraction = attack_fraction;
        self.config.release_fraction = release_fraction;
        self
    }

    /// Default: 64
    pub fn steal_fade_samples(mut self, samples: u32) -> Self {
        self.config.steal_fade_samples = samples;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Default: 64
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.config.command_capacity = capacity;
        self
    }

    /// Default: 1
    pub fn readers(mut self, count: usize) -> Self {
        self.config.readers = count;
        self
    }

    pub fn build(self) -> Result<(Engine, EngineHandle)> {
        let config = self.config;
        config.validate()?;

        let shared = Arc::new(Shared::new(config.readers, GrainParams::default()));
        let (command_tx, command_rx) = crossbeam_channel::bounded(config.command_capacity);
        let handle = EngineHandle::new(
            command_tx,
            Arc::clone(&shared),
            config.sample_rate,
            config.seed,
        );

        tracing::debug!(
            "Building engine: {} Hz, block {}, {} samples of history, {} grains, {} readers",
            config.sample_rate,
            config.block_size,
            config.capacity_samples(),
            config.max_grains,
            config.readers
        );
        let engine = Engine::new(config, command_rx, shared)?;
        Ok((engine, handle))
    }
}
