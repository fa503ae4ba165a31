//! # Reel - Real-time Resampling and Granular Playback
//!
//! A live input stream goes into a fixed-size ring buffer; any number of
//! readers and grains play it back at arbitrary, fractional, negative or
//! changing rates, all inside the audio callback without allocating or
//! locking.
//!
//! ## Architecture
//!
//! Reel is an umbrella crate that coordinates:
//! - **reel-core** - Ring buffer, fractional cursors, resampling readers, rate policy
//! - **reel-grain** - Grain envelope, fixed grain pool, periodic and scatter scheduling
//! - **reel-fx** - Reverse delay, pitch shifter, time-stretch player, buffer repeat, shimmer
//!
//! [`Engine`] lives on the audio thread; [`EngineHandle`] controls it from
//! anywhere else.
//!
//! ## Quick Start
//!
//! ```
//! use reel::prelude::*;
//!
//! let (mut engine, handle) = Engine::builder()
//!     .sample_rate(48000.0)
//!     .block_size(256)
//!     .build()?;
//!
//! // Reader 0 plays the input back an octave down.
//! handle.set_rate(0, 0.5)?;
//!
//! // Grains 80 ms long, read 100 ms behind the live input.
//! handle.set_grain_params(GrainParams::default());
//! handle.trigger();
//!
//! // Audio callback
//! let input = [0.0f32; 256];
//! let mut output = [0.0f32; 256];
//! engine.process_block(&input, &mut output);
//! # Ok::<(), reel::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Engine plus the `fx` units
//! - `fx` - Ready-made effects built on the engine core

/// Re-export of reel-core for direct access
pub use reel_core as core;

/// Re-export of reel-grain for direct access
pub use reel_grain as grain;

#[cfg(feature = "fx")]
pub use reel_fx as fx;

// Core types
pub use reel_core::{
    // Lock-free primitives
    AtomicCounter,
    AtomicFlag,
    AtomicFloat,

    // Host interface
    BlockProcessor,
    EngineConfig,
    FractionalCursor,
    GainRamp,

    // Rate policy
    PlayDirection,
    Rate,
    ReadMode,
    ResamplingReader,

    // History
    RingBuffer,
    StreamWriter,
    Varispeed,
    MAX_RATE,
    MIN_RATE,
};

// Grains
pub use reel_grain::{
    GrainEnvelope, GrainId, GrainParams, GrainPool, GrainScheduler, GrainSpec, Pan,
    PeriodicRetrigger, PoolStats, RandomScatter, ScatterParams, SchedulePolicy, Spacing,
    TriggerOutcome,
};

#[cfg(feature = "fx")]
pub use reel_fx::{
    BufferRepeat, DryWet, PitchShifter, ReverseDelay, Shimmer, StretchParams, StretchPlayer,
};

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;
mod handle;
mod stats;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use handle::EngineHandle;
pub use stats::{EngineStats, StatsSnapshot};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{Engine, EngineBuilder, EngineHandle, StatsSnapshot};

    // Essential types
    pub use crate::core::{BlockProcessor, EngineConfig, Rate, ReadMode, RingBuffer};

    // Grains
    pub use crate::grain::{GrainParams, ScatterParams, SchedulePolicy, Spacing};

    // Effects
    #[cfg(feature = "fx")]
    pub use crate::fx::{BufferRepeat, PitchShifter, ReverseDelay, Shimmer, StretchPlayer};
}
