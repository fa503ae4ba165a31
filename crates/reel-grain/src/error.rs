//! Error types for reel-grain

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] reel_core::Error),

    #[error("Invalid envelope: attack={attack}, release={release}. Each must be in 0..=1 and sum to at most 1")]
    InvalidEnvelope { attack: f32, release: f32 },

    #[error("Invalid pool size: {0}. Must be between 1 and 256 grains")]
    InvalidPoolSize(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
