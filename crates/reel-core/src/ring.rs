//! Fixed-capacity sample history with a monotonically advancing write cursor.
//!
//! ## Layout
//!
//! Samples live in `capacity` atomic 32-bit cells. The writer stores samples with
//! `Relaxed` ordering and then publishes the new `total_written` count with
//! `Release`; readers load the count with `Acquire`. A reader racing the writer
//! therefore sees, at worst, a sample that is one block older or newer than it
//! expected. It never sees uninitialized memory, because every slot is a valid
//! `f32` from construction onwards.
//!
//! ## Indexing
//!
//! - **slot**: physical index in `[0, capacity)`
//! - **absolute index**: position in the whole input stream (`0..total_written`)
//! - `write_index == total_written mod capacity`, derived rather than stored, so
//!   the two can never disagree.
//!
//! ## Staleness
//!
//! An absolute index whose age (`total_written - index`) exceeds `capacity` has
//! been overwritten. Reading it is allowed and returns whatever now occupies the
//! slot; callers decide whether that matters.

use crate::{Error, Result};
use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ring buffer shared between one [`StreamWriter`](crate::StreamWriter) and any
/// number of readers.
#[derive(Debug)]
pub struct RingBuffer {
    storage: Box<[AtomicF32]>,
    total_written: AtomicU64,
}

impl RingBuffer {
    /// Allocate a silent buffer of `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let storage = (0..capacity).map(|_| AtomicF32::new(0.0)).collect();
        Ok(Self {
            storage,
            total_written: AtomicU64::new(0),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Samples ever written. Never wraps.
    #[inline]
    pub fn total_written(&self) -> u64 {
        self.total_written.load(Ordering::Acquire)
    }

    /// Slot the next sample will be written to.
    #[inline]
    pub fn write_index(&self) -> usize {
        (self.total_written() % self.capacity() as u64) as usize
    }

    /// How far back a caller may read without hitting overwritten data.
    #[inline]
    pub fn sample_count_available(&self) -> usize {
        self.total_written().min(self.capacity() as u64) as usize
    }

    /// Append `samples`, wrapping as needed.
    ///
    /// If more than `capacity` samples are given, only the last `capacity` are
    /// stored, but `total_written` still advances by the full length.
    pub(crate) fn write(&self, samples: &[f32]) {
        let capacity = self.capacity();
        let total = self.total_written.load(Ordering::Relaxed);

        let skip = samples.len().saturating_sub(capacity);
        let kept = &samples[skip..];
        let start = ((total + skip as u64) % capacity as u64) as usize;

        let first = kept.len().min(capacity - start);
        for (cell, &sample) in self.storage[start..start + first].iter().zip(kept) {
            cell.store(sample, Ordering::Relaxed);
        }
        for (cell, &sample) in self.storage.iter().zip(&kept[first..]) {
            cell.store(sample, Ordering::Relaxed);
        }

        self.total_written
            .store(total + samples.len() as u64, Ordering::Release);
    }

    /// Silence every slot and rewind the write cursor.
    pub(crate) fn clear(&self) {
        for cell in self.storage.iter() {
            cell.store(0.0, Ordering::Relaxed);
        }
        self.total_written.store(0, Ordering::Release);
    }

    /// Raw sample at a physical slot. Out-of-range slots wrap.
    #[inline]
    pub fn read_slot(&self, slot: usize) -> f32 {
        self.storage[slot % self.capacity()].load(Ordering::Relaxed)
    }

    /// Linearly interpolated read at a fractional slot position.
    ///
    /// Both neighbours are wrapped into `[0, capacity)`, so any finite position
    /// is valid, including negative ones. Integer positions return the stored
    /// sample bit-for-bit. Non-finite positions read slot 0.
    #[inline]
    pub fn read_at(&self, position: f64) -> f32 {
        if !position.is_finite() {
            return self.read_slot(0);
        }
        let capacity = self.capacity();
        let base = position.floor();
        let frac = (position - base) as f32;

        let index_a = (base.rem_euclid(capacity as f64) as usize).min(capacity - 1);
        let sample_a = self.storage[index_a].load(Ordering::Relaxed);
        if frac == 0.0 {
            return sample_a;
        }

        let index_b = if index_a + 1 == capacity { 0 } else { index_a + 1 };
        let sample_b = self.storage[index_b].load(Ordering::Relaxed);
        sample_a + (sample_b - sample_a) * frac
    }

    /// Delay-line style read: `1.0` is the most recent sample, `2.0` the one
    /// before it, and so on. Fractional delays interpolate.
    #[inline]
    pub fn read_behind(&self, delay_samples: f64) -> f32 {
        self.read_at(self.write_index() as f64 - delay_samples)
    }

    /// Physical slot holding an absolute stream index.
    #[inline]
    pub fn slot_of(&self, absolute: i64) -> usize {
        absolute.rem_euclid(self.capacity() as i64) as usize
    }

    /// Fractional slot position `samples_behind` the write head.
    #[inline]
    pub fn position_behind(&self, samples_behind: f64) -> f64 {
        let capacity = self.capacity() as f64;
        let position = (self.write_index() as f64 - samples_behind).rem_euclid(capacity);
        if position >= capacity {
            0.0
        } else {
            position
        }
    }

    /// True when `absolute` was never written or has been overwritten.
    #[inline]
    pub fn is_stale(&self, absolute: i64) -> bool {
        let total = self.total_written() as i64;
        let age = total - absolute;
        age < 1 || age > self.sample_count_available() as i64
    }

    /// Copy the most recent `out.len()` samples in chronological order.
    ///
    /// Slots older than the available history come back as whatever the buffer
    /// holds there (silence until the buffer has wrapped once).
    pub fn copy_latest(&self, out: &mut [f32]) {
        let total = self.total_written() as i64;
        let start = total - out.len() as i64;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.read_slot(self.slot_of(start + i as i64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn ring_with(capacity: usize, samples: &[f32]) -> RingBuffer {
        let ring = RingBuffer::new(capacity).unwrap();
        ring.write(samples);
        ring
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(RingBuffer::new(0).unwrap_err(), Error::InvalidCapacity(0));
    }

    #[test]
    fn test_starts_silent() {
        let ring = RingBuffer::new(8).unwrap();
        assert_eq!(ring.total_written(), 0);
        assert_eq!(ring.write_index(), 0);
        assert_eq!(ring.sample_count_available(), 0);
        for pos in [0.0, 3.5, -2.25, 100.0] {
            assert_eq!(ring.read_at(pos), 0.0);
        }
    }

    #[test]
    fn test_capacity_four_holds_last_four() {
        let ring = ring_with(4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(ring.total_written(), 6);
        assert_eq!(ring.write_index(), 2);
        assert_eq!(ring.sample_count_available(), 4);

        let mut latest = [0.0; 4];
        ring.copy_latest(&mut latest);
        assert_eq!(latest, [3.0, 4.0, 5.0, 6.0]);

        // Two samples behind the write head is the second most recent sample.
        let slot = (ring.write_index() + 4 - 2) % 4;
        assert_eq!(ring.read_at(slot as f64), 5.0);
        assert_eq!(ring.read_behind(2.0), 5.0);
        assert_eq!(ring.read_behind(1.0), 6.0);
    }

    #[test]
    fn test_oversized_write_keeps_tail() {
        let input: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let ring = ring_with(4, &input);
        assert_eq!(ring.total_written(), 10);
        assert_eq!(ring.write_index(), 2);

        let mut latest = [0.0; 4];
        ring.copy_latest(&mut latest);
        assert_eq!(latest, [6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_interpolation_between_neighbours() {
        let ring = ring_with(8, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_abs_diff_eq!(ring.read_at(0.5), 0.5);
        assert_abs_diff_eq!(ring.read_at(1.25), 1.25);
        assert_abs_diff_eq!(ring.read_at(3.75), 3.75);
    }

    #[test]
    fn test_interpolation_wraps_last_slot_to_first() {
        let ring = ring_with(4, &[10.0, 0.0, 0.0, 20.0]);
        // Between slot 3 (20.0) and slot 0 (10.0).
        assert_abs_diff_eq!(ring.read_at(3.5), 15.0);
        // Negative positions wrap the same way.
        assert_abs_diff_eq!(ring.read_at(-0.5), 15.0);
    }

    #[test]
    fn test_non_finite_position_reads_slot_zero() {
        let ring = ring_with(4, &[7.0, 1.0, 2.0, 3.0]);
        assert_eq!(ring.read_at(f64::NAN), 7.0);
        assert_eq!(ring.read_at(f64::INFINITY), 7.0);
    }

    #[test]
    fn test_staleness() {
        let ring = ring_with(4, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(ring.is_stale(6), "not written yet");
        assert!(!ring.is_stale(5));
        assert!(!ring.is_stale(2));
        assert!(ring.is_stale(1), "overwritten");
        assert!(ring.is_stale(-1));
    }

    #[test]
    fn test_clear() {
        let ring = ring_with(4, &[1.0, 2.0, 3.0]);
        ring.clear();
        assert_eq!(ring.total_written(), 0);
        assert_eq!(ring.read_at(1.0), 0.0);
    }

    #[test]
    fn test_position_behind() {
        let ring = ring_with(8, &[0.0, 1.0, 2.0]);
        assert_abs_diff_eq!(ring.position_behind(1.0), 2.0);
        assert_abs_diff_eq!(ring.position_behind(4.0), 7.0);
        assert_abs_diff_eq!(ring.position_behind(0.5), 2.5);
    }

    proptest! {
        #[test]
        fn prop_integer_reads_return_last_written(
            capacity in 1usize..64,
            blocks in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 0..40), 1..8),
        ) {
            let ring = RingBuffer::new(capacity).unwrap();
            let mut history = Vec::new();
            for block in &blocks {
                ring.write(block);
                history.extend_from_slice(block);
            }

            let total = history.len() as i64;
            let valid = ring.sample_count_available() as i64;
            for age in 1..=valid {
                let absolute = total - age;
                let slot = ring.slot_of(absolute);
                prop_assert_eq!(ring.read_at(slot as f64), history[absolute as usize]);
            }
        }

        #[test]
        fn prop_wraparound_keeps_last_capacity_in_order(
            capacity in 1usize..32,
            extra in 1usize..50,
        ) {
            let ring = RingBuffer::new(capacity).unwrap();
            let input: Vec<f32> = (0..capacity + extra).map(|i| i as f32).collect();
            for chunk in input.chunks(7) {
                ring.write(chunk);
            }
            let mut latest = vec![0.0; capacity];
            ring.copy_latest(&mut latest);
            prop_assert_eq!(&latest[..], &input[extra..]);
            prop_assert_eq!(ring.write_index(), (capacity + extra) % capacity);
        }
    }
}
