//! The sole writer into a [`RingBuffer`].

use crate::{Result, RingBuffer};
use std::sync::Arc;

/// Appends host input blocks to the ring, once per audio callback.
///
/// Not `Clone`: owning a `StreamWriter` is what grants write access, so there
/// is exactly one writer per ring. Readers get `&RingBuffer` from
/// [`ring`](Self::ring) or a shared handle from [`share`](Self::share).
#[derive(Debug)]
pub struct StreamWriter {
    ring: Arc<RingBuffer>,
}

impl StreamWriter {
    pub fn new(ring: RingBuffer) -> Self {
        Self {
            ring: Arc::new(ring),
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let ring = RingBuffer::new(capacity)?;
        tracing::debug!("Allocated ring buffer of {} samples", capacity);
        Ok(Self::new(ring))
    }

    /// Forward one host block verbatim. No resampling, no filtering.
    #[inline]
    pub fn push_block(&mut self, input: &[f32]) {
        self.ring.write(input);
    }

    #[inline]
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Read-only handle for readers living on other threads.
    pub fn share(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.ring)
    }

    #[inline]
    pub fn write_index(&self) -> usize {
        self.ring.write_index()
    }

    #[inline]
    pub fn total_written(&self) -> u64 {
        self.ring.total_written()
    }

    /// Silence the history and rewind to a fresh stream.
    pub fn reset(&mut self) {
        self.ring.clear();
    }
}
