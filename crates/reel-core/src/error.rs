//! Error types for reel-core.

use thiserror::Error;

/// Error type for reel-core operations.
///
/// Only construction can fail. Everything reachable from the audio callback
/// clamps instead of returning an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid capacity: {0}. Must be at least 1 sample")]
    InvalidCapacity(usize),

    #[error("Invalid sample rate: {0}. Must be between 8000 and 384000 Hz")]
    InvalidSampleRate(f64),

    #[error("Invalid block size: {0}. Must be between 1 and 16384 samples")]
    InvalidBlockSize(usize),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
