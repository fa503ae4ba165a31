//! Centralized error type for the reel umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] reel_core::Error),

    #[error("Grain: {0}")]
    Grain(#[from] reel_grain::Error),

    #[cfg(feature = "fx")]
    #[error("Fx: {0}")]
    Fx(#[from] reel_fx::Error),

    #[error("No reader {index}: engine has {count}")]
    InvalidReader { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
