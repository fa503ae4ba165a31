//! Ready-made units built on the reel ring buffer and grain engine.
//!
//! Every unit implements [`reel_core::BlockProcessor`]: push the host's input
//! block, then produce an output block of the same length.
//!
//! - [`ReverseDelay`]: plays each `delay` window of input backwards
//! - [`PitchShifter`]: two-tap live pitch shift at constant latency
//! - [`StretchPlayer`]: time-stretch playback of a clip, speed and pitch independent
//! - [`BufferRepeat`]: stutter the last slice of input
//! - [`Shimmer`]: random grain cloud over the live input, mono or stereo
//!
//! # Example
//!
//! ```
//! use reel_core::BlockProcessor;
//! use reel_fx::ReverseDelay;
//!
//! let mut delay = ReverseDelay::new(48000.0, 0.25, 0.5)?;
//! let input = [0.0f32; 256];
//! let mut output = [0.0f32; 256];
//! delay.process_block(&input, &mut output);
//! # Ok::<(), reel_fx::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod mix;
pub use mix::DryWet;

mod reverse_delay;
pub use reverse_delay::ReverseDelay;

mod pitch_shift;
pub use pitch_shift::PitchShifter;

mod stretch;
pub use stretch::{StretchParams, StretchPlayer};

mod repeat;
pub use repeat::BufferRepeat;

mod shimmer;
pub use shimmer::Shimmer;
