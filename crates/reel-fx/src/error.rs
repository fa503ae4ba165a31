//! Error types for reel-fx

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] reel_core::Error),

    #[error(transparent)]
    Grain(#[from] reel_grain::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// `value` if finite and strictly positive.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// `mix` if within `0..=1`.
pub(crate) fn require_mix(mix: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&mix) {
        Ok(mix)
    } else {
        Err(Error::InvalidParameter(format!(
            "mix must be within 0..=1, got {mix}"
        )))
    }
}
