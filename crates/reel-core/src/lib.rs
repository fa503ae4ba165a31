//! Ring buffer, fractional cursors and resampling readers.
//!
//! # Primary API
//!
//! - [`RingBuffer`]: fixed-capacity history, safe to read from any thread
//! - [`StreamWriter`]: the single writer, fed one host block per callback
//! - [`FractionalCursor`]: real-valued read position with linear interpolation
//! - [`ResamplingReader`]: forward, reverse, varispeed and mirrored-slice playback
//! - [`EngineConfig`]: construction-time knobs
//!
//! # Example
//!
//! ```
//! use reel_core::{ResamplingReader, StreamWriter};
//!
//! let mut writer = StreamWriter::with_capacity(48000)?;
//! let mut reader = ResamplingReader::new(0.5);
//! reader.start_behind(writer.ring(), 512.0);
//!
//! let input = [0.0f32; 256];
//! let mut output = [0.0f32; 256];
//! writer.push_block(&input);
//! reader.produce_block(writer.ring(), &mut output);
//! # Ok::<(), reel_core::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::EngineConfig;

mod ring;
pub use ring::RingBuffer;

mod writer;
pub use writer::StreamWriter;

pub mod rate;
pub use rate::{PlayDirection, Rate, Varispeed, MAX_RATE, MIN_RATE};

mod cursor;
pub use cursor::{wrap_position, FractionalCursor};

mod reader;
pub use reader::{ReadMode, ResamplingReader};

mod processor;
pub use processor::{BlockProcessor, GainRamp};

pub(crate) mod lockfree;
pub use lockfree::{AtomicCounter, AtomicFlag, AtomicFloat};
