//! Decision tallies.
//!
//! Every call to `SamplingCore::sample` lands in exactly one of `forwarded`
//! or `dropped`; `resets_armed` counts the burst crossings that handed a
//! reset to the scheduler. Resets that fire are not tallied here.

use crate::domain::policy::{SamplingDecision, Verdict};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running tallies for one sampler tree.
///
/// Handles are cheap to clone and all observe the same numbers. Updates are
/// relaxed: a snapshot taken while other threads sample may be mid-update,
/// but nothing is ever lost once they finish.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    tallies: Arc<Tallies>,
}

#[derive(Debug, Default)]
struct Tallies {
    forwarded: AtomicU64,
    dropped: AtomicU64,
    resets_armed: AtomicU64,
}

impl Metrics {
    /// All tallies start at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one verdict.
    pub(crate) fn record(&self, verdict: Verdict) {
        let tally = match verdict.decision {
            SamplingDecision::Forward => &self.tallies.forwarded,
            SamplingDecision::Drop => &self.tallies.dropped,
        };
        tally.fetch_add(1, Ordering::Relaxed);
        if verdict.arm_reset {
            self.tallies.resets_armed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn entries_forwarded(&self) -> u64 {
        self.tallies.forwarded.load(Ordering::Relaxed)
    }

    pub fn entries_dropped(&self) -> u64 {
        self.tallies.dropped.load(Ordering::Relaxed)
    }

    /// Burst crossings, one per message per tick at most.
    pub fn resets_armed(&self) -> u64 {
        self.tallies.resets_armed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries_forwarded: self.entries_forwarded(),
            entries_dropped: self.entries_dropped(),
            resets_armed: self.resets_armed(),
        }
    }

    /// Zero the tallies. Message counts and pending resets are untouched.
    pub fn reset(&self) {
        for tally in [
            &self.tallies.forwarded,
            &self.tallies.dropped,
            &self.tallies.resets_armed,
        ] {
            tally.store(0, Ordering::Relaxed);
        }
    }
}

/// Tallies copied out at one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub entries_forwarded: u64,
    pub entries_dropped: u64,
    pub resets_armed: u64,
}

impl MetricsSnapshot {
    /// Share of sampled entries that were dropped, in `0.0..=1.0`.
    ///
    /// An idle sampler reports 0.0.
    pub fn drop_rate(&self) -> f64 {
        match self.total_entries() {
            0 => 0.0,
            total => self.entries_dropped as f64 / total as f64,
        }
    }

    pub fn total_entries(&self) -> u64 {
        self.entries_forwarded.saturating_add(self.entries_dropped)
    }
}
