//! Atomics the control thread writes and the audio thread reads once per block.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A control value (rate, gain) published with release/acquire ordering.
///
/// Aligned to a cache line so neighbouring per-reader values in a `Vec` do not
/// share one.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFloat(AtomicF32);

impl AtomicFloat {
    pub fn new(value: f32) -> Self {
        Self(AtomicF32::new(value))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value, Ordering::Release);
    }
}

/// On/off control state, e.g. a reader's freeze switch.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag(AtomicBool);

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self(AtomicBool::new(value))
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Release);
    }
}

/// Monotonic event counter, bumped from the audio thread and read elsewhere.
/// Counts carry no other data, so relaxed ordering is enough.
#[derive(Debug, Default)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn incr(&self) {
        self.add(1);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_float_and_flag() {
        let rate = AtomicFloat::new(1.0);
        rate.set(-0.5);
        assert_eq!(rate.get(), -0.5);

        let frozen = AtomicFlag::new(false);
        frozen.set(true);
        assert!(frozen.get());
    }

    #[test]
    fn test_values_do_not_share_cache_lines() {
        assert_eq!(std::mem::align_of::<AtomicFloat>(), 64);
        assert_eq!(std::mem::size_of::<AtomicFlag>(), 64);
    }

    #[test]
    fn test_counter_across_threads() {
        let counter = Arc::new(AtomicCounter::new());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.incr();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        counter.add(5);
        assert_eq!(counter.get(), 4005);
    }
}
