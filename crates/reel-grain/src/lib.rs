//! Grain pool, envelopes and scheduling for the reel engine.
//!
//! Grains read from a shared [`reel_core::RingBuffer`] through their own
//! fractional cursor, shaped by a [`GrainEnvelope`]. The [`GrainPool`] is
//! fixed-size and steals the oldest grain when full; a [`GrainScheduler`]
//! pairs the pool with a [`SchedulePolicy`] that starts grains on its own.
//!
//! # Example
//!
//! ```
//! use reel_core::{EngineConfig, StreamWriter};
//! use reel_grain::{GrainScheduler, PeriodicRetrigger, SchedulePolicy};
//!
//! let config = EngineConfig::default();
//! let mut writer = StreamWriter::with_capacity(config.capacity_samples())?;
//! let mut scheduler = GrainScheduler::from_config(&config)?;
//! scheduler.set_policy(SchedulePolicy::Periodic(PeriodicRetrigger::new(2205, 2.0)));
//!
//! writer.push_block(&[0.1; 4410]);
//! scheduler.capture(writer.ring());
//!
//! let mut out = [0.0f32; 512];
//! scheduler.tick_mono(writer.ring(), &mut out);
//! # Ok::<(), reel_grain::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod envelope;
pub use envelope::GrainEnvelope;

mod grain;
pub use grain::{GrainSpec, Pan};

mod pool;
pub use pool::{
    min_source_offset, GrainId, GrainPool, PoolStats, TriggerOutcome, MAX_POOL_SIZE,
};

pub mod policy;
pub use policy::{
    GrainParams, PeriodicRetrigger, RandomScatter, ScatterParams, SchedulePolicy, Spacing,
};

mod scheduler;
pub use scheduler::GrainScheduler;
