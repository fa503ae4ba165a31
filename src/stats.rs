//! Counters the audio thread bumps and control threads read.

use reel_core::AtomicCounter;
use reel_grain::PoolStats;

/// Live engine counters. Every field is monotonic for the engine's lifetime,
/// including across [`reset`](crate::Engine::reset).
#[derive(Debug, Default)]
pub struct EngineStats {
    pub(crate) blocks: AtomicCounter,
    pub(crate) grains_triggered: AtomicCounter,
    pub(crate) grains_stolen: AtomicCounter,
    pub(crate) stale_triggers: AtomicCounter,
    pub(crate) commands_dropped: AtomicCounter,
    pub(crate) clamped_rates: AtomicCounter,
}

impl EngineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            blocks: self.blocks.get(),
            grains_triggered: self.grains_triggered.get(),
            grains_stolen: self.grains_stolen.get(),
            stale_triggers: self.stale_triggers.get(),
            commands_dropped: self.commands_dropped.get(),
            clamped_rates: self.clamped_rates.get(),
        }
    }

    /// Fold the growth of the pool's own counters since `last` into ours.
    pub(crate) fn absorb_pool(&self, last: &PoolStats, now: &PoolStats) {
        self.grains_triggered
            .add(now.triggered.saturating_sub(last.triggered));
        self.grains_stolen.add(now.stolen.saturating_sub(last.stolen));
        self.stale_triggers.add(now.stale.saturating_sub(last.stale));
    }
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Calls to `produce_block` / `produce_block_stereo`.
    pub blocks: u64,
    pub grains_triggered: u64,
    /// Grains retired early because the pool was full.
    pub grains_stolen: u64,
    /// Triggers that reached past the recorded history and read stale data.
    pub stale_triggers: u64,
    /// Control commands lost to a full queue.
    pub commands_dropped: u64,
    /// Rates outside the playable range that were clamped.
    pub clamped_rates: u64,
}
