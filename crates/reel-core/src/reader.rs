//! Block-producing reader over the ring history.
//!
//! Two traversal modes:
//!
//! - **Varispeed**: a [`FractionalCursor`] walks the history at any rate.
//!   `1.0` replays the input delayed, `0.5` an octave down, `-1.0` backwards.
//! - **Mirrored slice**: reverse delay. For the output sample emitted alongside
//!   input sample `n`, read input sample `n - 2·(n mod D) - 1`, i.e. the previous
//!   `D`-sample window played back to front. Because `n` comes from the 64-bit
//!   `total_written` count instead of the wrapped write index, the window phase
//!   never drifts, whatever the capacity.

use crate::cursor::FractionalCursor;
use crate::rate::Rate;
use crate::RingBuffer;

/// How a [`ResamplingReader`] walks the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadMode {
    Varispeed,
    MirroredSlice {
        /// Slice window length; rounded to whole samples once per block.
        slice_samples: f64,
    },
}

impl Default for ReadMode {
    fn default() -> Self {
        Self::Varispeed
    }
}

/// Produces fixed-size output blocks by interpolated reads from a ring.
#[derive(Debug, Clone, Default)]
pub struct ResamplingReader {
    cursor: FractionalCursor,
    mode: ReadMode,
    frozen: bool,
}

impl ResamplingReader {
    pub fn new(rate: impl Into<Rate>) -> Self {
        Self {
            cursor: FractionalCursor::new(0.0, rate),
            mode: ReadMode::Varispeed,
            frozen: false,
        }
    }

    /// Reverse-delay reader over windows of `slice_samples`.
    pub fn mirrored(slice_samples: f64) -> Self {
        Self {
            mode: ReadMode::MirroredSlice { slice_samples },
            ..Self::new(Rate::REVERSE)
        }
    }

    /// Put the cursor `samples_behind` the write head.
    ///
    /// With `samples_behind == N` and rate 1.0 the reader replays the input
    /// delayed by `N` samples.
    pub fn start_behind(&mut self, ring: &RingBuffer, samples_behind: f64) {
        self.cursor.set_position(ring.position_behind(samples_behind));
    }

    pub fn set_position(&mut self, position: f64) {
        self.cursor.set_position(position);
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.cursor.position()
    }

    pub fn set_rate(&mut self, rate: impl Into<Rate>) {
        self.cursor.set_rate(rate);
    }

    #[inline]
    pub fn rate(&self) -> Rate {
        self.cursor.rate()
    }

    pub fn set_mode(&mut self, mode: ReadMode) {
        self.mode = mode;
    }

    #[inline]
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Frozen playback: the cursor stops advancing and repeats one sample.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Overwrite `out` with the next `out.len()` samples.
    ///
    /// In mirrored mode the block is aligned with the most recent `out.len()`
    /// input samples, so call it right after pushing a block of the same size.
    pub fn produce_block(&mut self, ring: &RingBuffer, out: &mut [f32]) {
        match self.mode {
            ReadMode::Varispeed => self.produce_varispeed(ring, out),
            ReadMode::MirroredSlice { slice_samples } => {
                produce_mirrored(ring, slice_samples, out)
            }
        }
    }

    /// Like [`produce_block`](Self::produce_block) but sums into `out`, scaled by `gain`.
    pub fn mix_block(&mut self, ring: &RingBuffer, out: &mut [f32], gain: f32) {
        match self.mode {
            ReadMode::Varispeed => {
                let capacity = ring.capacity();
                for sample in out.iter_mut() {
                    *sample += self.cursor.read(ring) * gain;
                    if !self.frozen {
                        self.cursor.advance(capacity);
                    }
                }
            }
            ReadMode::MirroredSlice { slice_samples } => {
                let slice = slice_length(slice_samples, ring.capacity());
                let first = ring.total_written() as i64 - out.len() as i64;
                for (i, sample) in out.iter_mut().enumerate() {
                    *sample += mirrored_sample(ring, first + i as i64, slice) * gain;
                }
            }
        }
    }

    fn produce_varispeed(&mut self, ring: &RingBuffer, out: &mut [f32]) {
        let capacity = ring.capacity();
        for sample in out.iter_mut() {
            *sample = self.cursor.read(ring);
            if !self.frozen {
                self.cursor.advance(capacity);
            }
        }
    }
}

fn produce_mirrored(ring: &RingBuffer, slice_samples: f64, out: &mut [f32]) {
    let slice = slice_length(slice_samples, ring.capacity());
    let first = ring.total_written() as i64 - out.len() as i64;
    for (i, sample) in out.iter_mut().enumerate() {
        *sample = mirrored_sample(ring, first + i as i64, slice);
    }
}

/// Whole-sample slice length, at least 1 and at most half the capacity so the
/// mirrored read (up to `2·D - 1` behind) never lands on overwritten data.
#[inline]
fn slice_length(slice_samples: f64, capacity: usize) -> i64 {
    let max = (capacity / 2).max(1) as f64;
    let rounded = if slice_samples.is_finite() {
        slice_samples.round()
    } else {
        1.0
    };
    rounded.clamp(1.0, max) as i64
}

/// Input sample mirrored within the window preceding absolute index `n`.
#[inline]
fn mirrored_sample(ring: &RingBuffer, n: i64, slice: i64) -> f32 {
    let source = n - 2 * n.rem_euclid(slice) - 1;
    if source < 0 {
        // Not primed yet.
        return 0.0;
    }
    ring.read_slot(ring.slot_of(source))
}
