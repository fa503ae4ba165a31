//! Playback rate policy, direction and varispeed.

/// Slowest magnitude a cursor may move at. Zero is substituted with this.
pub const MIN_RATE: f64 = 1e-4;

/// Fastest magnitude a cursor may move at.
pub const MAX_RATE: f64 = 16.0;

/// A playback rate that is never zero, never NaN and never unbounded.
///
/// Negative rates play backwards.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Rate(f64);

impl Rate {
    pub const UNITY: Rate = Rate(1.0);
    pub const REVERSE: Rate = Rate(-1.0);

    /// Clamp `value` into `MIN_RATE..=MAX_RATE` in magnitude, keeping its sign.
    /// Zero becomes `+MIN_RATE`, NaN becomes unity.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::UNITY;
        }
        let magnitude = value.abs().clamp(MIN_RATE, MAX_RATE);
        if value.is_sign_negative() && value != 0.0 {
            Self(-magnitude)
        } else {
            Self(magnitude)
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_reverse(self) -> bool {
        self.0 < 0.0
    }

    /// True when `value` would be altered by [`Rate::new`].
    pub fn needs_clamp(value: f64) -> bool {
        Self::new(value).0 != value
    }

    /// Frequency ratio for a pitch offset in semitones.
    pub fn from_semitones(semitones: f64) -> Self {
        Self::new(2.0_f64.powf(semitones / 12.0))
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::UNITY
    }
}

impl From<f64> for Rate {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayDirection {
    #[default]
    Forward,
    Reverse,
}

impl PlayDirection {
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward)
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, Self::Reverse)
    }
}

/// Speed plus direction, as set from a control surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Varispeed {
    pub direction: PlayDirection,
    /// 1.0 = normal, 0.5 = half, 2.0 = double
    pub speed: f64,
}

impl Default for Varispeed {
    fn default() -> Self {
        Self {
            direction: PlayDirection::Forward,
            speed: 1.0,
        }
    }
}

impl Varispeed {
    pub fn reverse() -> Self {
        Self {
            direction: PlayDirection::Reverse,
            speed: 1.0,
        }
    }

    pub fn is_forward(&self) -> bool {
        self.direction.is_forward()
    }

    pub fn is_reverse(&self) -> bool {
        self.direction.is_reverse()
    }

    /// Negative for reverse.
    pub fn rate(&self) -> Rate {
        let speed = self.speed.abs();
        if self.is_reverse() {
            Rate::new(-speed)
        } else {
            Rate::new(speed)
        }
    }
}
