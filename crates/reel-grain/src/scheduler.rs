//! Grain scheduler: a pool plus the policy that feeds it.

use crate::envelope::GrainEnvelope;
use crate::policy::{ms_to_samples, GrainParams, SchedulePolicy};
use crate::pool::{GrainPool, PoolStats, TriggerOutcome};
use crate::Result;
use reel_core::{EngineConfig, Rate, RingBuffer};

/// Owns the grain pool and decides when grains start.
///
/// Each tick first lets the active policy emit its triggers for the block,
/// then renders every sounding grain. Manual triggers can be mixed in with
/// any policy.
#[derive(Debug)]
pub struct GrainScheduler {
    pool: GrainPool,
    policy: SchedulePolicy,
    params: GrainParams,
    sample_rate: f64,
    running: bool,
}

impl GrainScheduler {
    pub fn new(pool: GrainPool, sample_rate: f64) -> Self {
        Self {
            pool,
            policy: SchedulePolicy::Manual,
            params: GrainParams::default(),
            sample_rate,
            running: true,
        }
    }

    /// Build the pool and envelope described by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let envelope = GrainEnvelope::new(config.attack_fraction, config.release_fraction)?;
        let pool = GrainPool::new(config.max_grains, envelope, config.steal_fade_samples)?;
        tracing::debug!(
            "Created grain scheduler: {} grains, attack {}, release {}",
            config.max_grains,
            config.attack_fraction,
            config.release_fraction
        );
        Ok(Self::new(pool, config.sample_rate))
    }

    pub fn pool(&self) -> &GrainPool {
        &self.pool
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut SchedulePolicy {
        &mut self.policy
    }

    /// Swap the policy as configured. Grains already playing are left alone;
    /// later [`set_params`](Self::set_params) calls reconfigure it.
    pub fn set_policy(&mut self, policy: SchedulePolicy) {
        self.policy = policy;
    }

    pub fn params(&self) -> &GrainParams {
        &self.params
    }

    pub fn set_params(&mut self, params: GrainParams) {
        if params == self.params {
            return;
        }
        self.params = params;
        self.policy.apply_params(&self.params, self.sample_rate);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Let the policy start grains again.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop starting grains and send live ones into their release.
    pub fn stop(&mut self) {
        self.running = false;
        self.pool.release_all();
    }

    /// Release live grains without stopping the policy.
    pub fn release(&mut self) {
        if let SchedulePolicy::Periodic(periodic) = &mut self.policy {
            periodic.release();
        }
        self.pool.release_all();
    }

    /// Capture the latest slice for a periodic policy; no-op otherwise.
    pub fn capture(&mut self, ring: &RingBuffer) {
        if let SchedulePolicy::Periodic(periodic) = &mut self.policy {
            periodic.capture(ring);
        }
    }

    /// Start one grain from the current [`GrainParams`].
    pub fn trigger(&mut self, ring: &RingBuffer) -> TriggerOutcome {
        let offset = (self.params.source_offset_ms * self.sample_rate / 1000.0).round();
        let offset = if offset.is_finite() && offset > 0.0 {
            offset as usize
        } else {
            0
        };
        let length = ms_to_samples(self.params.length_ms, self.sample_rate);
        self.trigger_with(ring, offset, length, self.params.playback_rate)
    }

    /// Start one grain `source_offset` samples behind the write head.
    pub fn trigger_with(
        &mut self,
        ring: &RingBuffer,
        source_offset: usize,
        length: u32,
        rate: impl Into<Rate>,
    ) -> TriggerOutcome {
        self.pool.trigger(ring, source_offset, length, rate)
    }

    pub fn tick_mono(&mut self, ring: &RingBuffer, out: &mut [f32]) {
        out.fill(0.0);
        self.mix_mono(ring, out);
    }

    /// Add this block's grains to `out` instead of overwriting it.
    pub fn mix_mono(&mut self, ring: &RingBuffer, out: &mut [f32]) {
        if !self.running {
            self.pool.mix_mono(ring, out);
            return;
        }
        self.policy
            .run_block(ring, &mut self.pool, out.len(), |pool, range| {
                pool.mix_mono(ring, &mut out[range]);
            });
    }

    /// Only `min(left.len(), right.len())` samples are rendered.
    pub fn tick_stereo(&mut self, ring: &RingBuffer, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
        self.mix_stereo(ring, left, right);
    }

    pub fn mix_stereo(&mut self, ring: &RingBuffer, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);
        if !self.running {
            self.pool.mix_stereo(ring, left, right);
            return;
        }
        self.policy
            .run_block(ring, &mut self.pool, len, |pool, range| {
                pool.mix_stereo(ring, &mut left[range.clone()], &mut right[range]);
            });
    }

    /// Retire all grains, rewind the policy and resume.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.policy.reset();
        self.running = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PeriodicRetrigger, RandomScatter, ScatterParams, Spacing};
    use reel_core::StreamWriter;

    fn scheduler() -> GrainScheduler {
        let config = EngineConfig {
            sample_rate: 1000.0,
            max_grains: 8,
            ..EngineConfig::default()
        };
        GrainScheduler::from_config(&config).unwrap()
    }

    fn writer() -> StreamWriter {
        let mut writer = StreamWriter::with_capacity(4000).unwrap();
        writer.push_block(&[1.0; 4000]);
        writer
    }

    #[test]
    fn test_from_config_rejects_bad_envelope() {
        let config = EngineConfig {
            attack_fraction: 0.8,
            release_fraction: 0.8,
            ..EngineConfig::default()
        };
        assert!(GrainScheduler::from_config(&config).is_err());
    }

    #[test]
    fn test_manual_trigger_uses_params() {
        let writer = writer();
        let mut scheduler = scheduler();
        scheduler.set_params(GrainParams {
            length_ms: 50.0,
            source_offset_ms: 200.0,
            ..GrainParams::default()
        });
        let id = scheduler.trigger(writer.ring()).id();
        assert!(scheduler.pool().is_live(id));

        let mut out = vec![0.0f32; 60];
        scheduler.tick_mono(writer.ring(), &mut out);
        assert!(out[25] > 0.9);
        assert_eq!(out[55], 0.0);
        assert!(!scheduler.pool().is_live(id));
    }

    #[test]
    fn test_params_keep_periodic_slice() {
        let mut scheduler = scheduler();
        scheduler.set_policy(SchedulePolicy::Periodic(PeriodicRetrigger::new(10, 1.0)));
        scheduler.set_params(GrainParams {
            length_ms: 100.0,
            spacing: Spacing::Hop { ms: 25.0 },
            playback_rate: 0.5,
            gain: 0.25,
            ..GrainParams::default()
        });
        let SchedulePolicy::Periodic(periodic) = scheduler.policy() else {
            panic!("policy changed kind");
        };
        assert_eq!(periodic.slice_samples(), 10);
        assert_eq!(periodic.hop_samples(), 10);
        assert_eq!(periodic.rate().get(), 0.5);
        assert_eq!(periodic.gain(), 0.25);
    }

    #[test]
    fn test_stop_halts_policy_and_releases() {
        let writer = writer();
        let mut scheduler = scheduler();
        let scatter = RandomScatter::new(ScatterParams::default(), 1000.0, 1).unwrap();
        scheduler.set_policy(SchedulePolicy::Scatter(scatter));

        let mut out = vec![0.0f32; 200];
        scheduler.tick_mono(writer.ring(), &mut out);
        assert!(scheduler.stats().triggered > 0);

        scheduler.stop();
        let triggered = scheduler.stats().triggered;
        for _ in 0..10 {
            scheduler.tick_mono(writer.ring(), &mut out);
        }
        assert_eq!(scheduler.stats().triggered, triggered);
        assert!(scheduler.pool().is_silent());
        assert_eq!(out, vec![0.0; 200]);

        scheduler.start();
        scheduler.tick_mono(writer.ring(), &mut out);
        assert!(scheduler.stats().triggered > triggered);
    }

    #[test]
    fn test_capture_and_release_periodic() {
        let writer = writer();
        let mut scheduler = scheduler();
        scheduler.set_policy(SchedulePolicy::Periodic(PeriodicRetrigger::new(20, 1.0)));
        scheduler.capture(writer.ring());

        let mut out = vec![0.0f32; 100];
        scheduler.tick_mono(writer.ring(), &mut out);
        assert!(scheduler.stats().triggered >= 4);

        scheduler.release();
        let triggered = scheduler.stats().triggered;
        scheduler.tick_mono(writer.ring(), &mut out);
        assert_eq!(scheduler.stats().triggered, triggered);
    }

    #[test]
    fn test_reset_clears_everything() {
        let writer = writer();
        let mut scheduler = scheduler();
        scheduler.trigger(writer.ring());
        scheduler.stop();
        scheduler.reset();
        assert!(scheduler.is_running());
        assert!(scheduler.pool().is_silent());
        assert_eq!(scheduler.stats(), PoolStats::default());
    }
}
