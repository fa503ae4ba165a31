//! Fixed-size grain pool with oldest-first stealing.
//!
//! All slots are allocated in [`GrainPool::new`]. Triggering, ticking and
//! releasing never allocate, so the pool is safe to drive from the audio
//! thread. When every slot is busy a new trigger steals the oldest grain; the
//! stolen grain keeps playing in the slot's tail and fades out over
//! `steal_fade` samples so there is no click.

use crate::envelope::GrainEnvelope;
use crate::grain::{Grain, GrainSpec};
use crate::{Error, Result};
use reel_core::{Rate, RingBuffer};

/// Upper bound on simultaneously playing grains.
pub const MAX_POOL_SIZE: usize = 256;

/// Smallest distance behind the write head a grain of `length` samples at
/// `rate` may start from and still only read written samples.
///
/// A forward grain covers `length * rate` slots before it ends, plus one for
/// the interpolation neighbour. A reverse grain walks away from the head and
/// only needs to start on a written slot.
pub fn min_source_offset(length: u32, rate: Rate) -> usize {
    let span = length.max(1) as f64 * rate.get();
    if span > 0.0 {
        span.ceil() as usize + 1
    } else {
        1
    }
}

/// Identifies one triggered grain. Monotonic per pool, so a lower id is older.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GrainId(pub u64);

/// What happened when a grain was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A free slot was used.
    Started(GrainId),
    /// The pool was full; the oldest grain was retired to make room.
    Stole { started: GrainId, stolen: GrainId },
}

impl TriggerOutcome {
    pub fn id(&self) -> GrainId {
        match *self {
            TriggerOutcome::Started(id) => id,
            TriggerOutcome::Stole { started, .. } => started,
        }
    }
}

/// Counters kept by the pool. Plain integers: the pool is owned by one thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub triggered: u64,
    pub stolen: u64,
    /// Triggers whose source offset reached past the available history.
    pub stale: u64,
}

#[derive(Debug)]
pub struct GrainPool {
    grains: Vec<Grain>,
    envelope: GrainEnvelope,
    steal_fade: u32,
    next_seq: u64,
    stats: PoolStats,
}

impl GrainPool {
    pub fn new(max_grains: usize, envelope: GrainEnvelope, steal_fade: u32) -> Result<Self> {
        if max_grains == 0 || max_grains > MAX_POOL_SIZE {
            return Err(Error::InvalidPoolSize(max_grains));
        }
        Ok(Self {
            grains: vec![Grain::default(); max_grains],
            envelope,
            steal_fade: steal_fade.max(1),
            next_seq: 1,
            stats: PoolStats::default(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.grains.len()
    }

    pub fn envelope(&self) -> &GrainEnvelope {
        &self.envelope
    }

    pub fn set_envelope(&mut self, envelope: GrainEnvelope) {
        self.envelope = envelope;
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Grains currently playing or waiting on a start delay. Stolen tails are
    /// not counted.
    pub fn active_count(&self) -> usize {
        self.grains.iter().filter(|g| g.is_active()).count()
    }

    /// True when nothing in the pool makes sound, tails included.
    pub fn is_silent(&self) -> bool {
        !self.grains.iter().any(Grain::is_sounding)
    }

    pub fn is_live(&self, id: GrainId) -> bool {
        self.grains
            .iter()
            .any(|g| g.is_active() && g.seq() == id.0)
    }

    /// Ids of the live grains, oldest first.
    pub fn live_ids(&self) -> impl Iterator<Item = GrainId> + '_ {
        let mut min_seen = 0;
        std::iter::from_fn(move || {
            let next = self
                .grains
                .iter()
                .filter(|g| g.is_active() && g.seq() > min_seen)
                .map(Grain::seq)
                .min()?;
            min_seen = next;
            Some(GrainId(next))
        })
    }

    /// Start a grain `source_offset` samples behind the write head.
    ///
    /// Offsets closer than [`min_source_offset`] are pushed back to it so the
    /// grain never reaches unwritten slots. Those, and offsets reaching past the
    /// retained history, still play and are counted in [`PoolStats::stale`].
    pub fn trigger(
        &mut self,
        ring: &RingBuffer,
        source_offset: usize,
        length: u32,
        rate: impl Into<Rate>,
    ) -> TriggerOutcome {
        let rate = rate.into();
        let lead = min_source_offset(length, rate);
        let offset = source_offset.max(lead);
        if source_offset < lead || offset > ring.sample_count_available() {
            self.stats.stale += 1;
        }
        let position = ring.position_behind(offset as f64);
        self.trigger_at(GrainSpec::new(position, length, rate))
    }

    /// Count a trigger whose source was already overwritten.
    pub(crate) fn note_stale(&mut self) {
        self.stats.stale += 1;
    }

    /// Start a fully specified grain.
    pub fn trigger_at(&mut self, spec: GrainSpec) -> TriggerOutcome {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.stats.triggered += 1;
        let started = GrainId(seq);

        if let Some(free) = self.grains.iter_mut().find(|g| !g.is_active()) {
            free.start(&spec, seq);
            return TriggerOutcome::Started(started);
        }

        // Full: steal the oldest. The pool is never empty here.
        let Some(oldest) = self.grains.iter_mut().min_by_key(|g| g.seq()) else {
            return TriggerOutcome::Started(started);
        };
        let stolen = GrainId(oldest.seq());
        oldest.steal(&self.envelope, self.steal_fade);
        oldest.start(&spec, seq);
        self.stats.stolen += 1;
        TriggerOutcome::Stole { started, stolen }
    }

    /// Send every live grain into its release ramp.
    pub fn release_all(&mut self) {
        let envelope = self.envelope;
        for grain in self.grains.iter_mut() {
            grain.release(&envelope);
        }
    }

    /// Silence everything immediately, tails included.
    pub fn retire_all(&mut self) {
        for grain in self.grains.iter_mut() {
            grain.retire();
        }
    }

    /// Overwrite `out` with the sum of all grains.
    pub fn tick_mono(&mut self, ring: &RingBuffer, out: &mut [f32]) {
        out.fill(0.0);
        self.mix_mono(ring, out);
    }

    /// Add the sum of all grains to `out`.
    pub fn mix_mono(&mut self, ring: &RingBuffer, out: &mut [f32]) {
        let envelope = self.envelope;
        for grain in self.grains.iter_mut().filter(|g| g.is_sounding()) {
            for sample in out.iter_mut() {
                if let Some((tail, _)) = grain.next_tail_sample(ring) {
                    *sample += tail;
                }
                if let Some((s, _)) = grain.next_grain_sample(ring, &envelope) {
                    *sample += s;
                }
            }
        }
    }

    /// Overwrite `left`/`right` with the equal-power panned sum of all grains.
    ///
    /// Only `min(left.len(), right.len())` samples are rendered.
    pub fn tick_stereo(&mut self, ring: &RingBuffer, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
        self.mix_stereo(ring, left, right);
    }

    /// Add the panned sum of all grains to `left`/`right`.
    pub fn mix_stereo(&mut self, ring: &RingBuffer, left: &mut [f32], right: &mut [f32]) {
        let envelope = self.envelope;
        for grain in self.grains.iter_mut().filter(|g| g.is_sounding()) {
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                if let Some((tail, pan)) = grain.next_tail_sample(ring) {
                    let (gl, gr) = pan.gains();
                    *l += tail * gl;
                    *r += tail * gr;
                }
                if let Some((s, pan)) = grain.next_grain_sample(ring, &envelope) {
                    let (gl, gr) = pan.gains();
                    *l += s * gl;
                    *r += s * gr;
                }
            }
        }
    }

    /// Retire everything and restart ids and counters.
    pub fn reset(&mut self) {
        self.retire_all();
        self.next_seq = 1;
        self.stats = PoolStats::default();
    }
}
