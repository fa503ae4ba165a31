//! Fractional read position over a [`RingBuffer`].

use crate::rate::Rate;
use crate::RingBuffer;

/// A real-valued read position that advances by `rate` per sample.
///
/// The position is kept wrapped into `[0, capacity)` after every advance so
/// that long runs do not lose sub-sample precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalCursor {
    position: f64,
    rate: Rate,
}

impl FractionalCursor {
    pub fn new(position: f64, rate: impl Into<Rate>) -> Self {
        Self {
            position,
            rate: rate.into(),
        }
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = position;
    }

    pub fn set_rate(&mut self, rate: impl Into<Rate>) {
        self.rate = rate.into();
    }

    /// Interpolated sample at the current position.
    #[inline]
    pub fn read(&self, ring: &RingBuffer) -> f32 {
        ring.read_at(self.position)
    }

    #[inline]
    pub fn advance(&mut self, capacity: usize) {
        self.position = wrap_position(self.position + self.rate.get(), capacity);
    }

    /// Read then advance.
    #[inline]
    pub fn next_sample(&mut self, ring: &RingBuffer) -> f32 {
        let sample = self.read(ring);
        self.advance(ring.capacity());
        sample
    }
}

impl Default for FractionalCursor {
    fn default() -> Self {
        Self::new(0.0, Rate::UNITY)
    }
}

/// Wrap `position` into `[0, capacity)`. Non-finite positions reset to 0.
#[inline]
pub fn wrap_position(position: f64, capacity: usize) -> f64 {
    if !position.is_finite() || capacity == 0 {
        return 0.0;
    }
    let capacity = capacity as f64;
    let wrapped = position.rem_euclid(capacity);
    // rem_euclid can round up to `capacity` for tiny negative inputs
    if wrapped >= capacity {
        0.0
    } else {
        wrapped
    }
}
