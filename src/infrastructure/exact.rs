//! Exact per-key counter backed by a concurrent map.
//!
//! Every distinct key gets its own atomic count, so there are no collisions.
//! Entries are created lazily and never evicted: memory grows with the
//! number of distinct keys ever seen.

use crate::application::ports::Counter;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Exact per-key counter.
///
/// DashMap provides shard-level read locks for lookups and write locks for
/// insertion. A count is incremented after the map guard is released, so
/// increments of an existing key never hold the table lock.
///
/// Resetting a key that was never incremented does nothing and creates no
/// entry.
///
/// # Example
/// ```
/// use tracing_sampler::{Counter, ExactCounter};
///
/// let counter = ExactCounter::new();
/// assert_eq!(counter.inc("xxxxxxxx-timeout"), 1);
/// assert_eq!(counter.inc("yyyyyyyy-timeout"), 1);
/// assert_eq!(counter.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ExactCounter {
    counts: DashMap<Box<str>, Arc<AtomicU64>, RandomState>,
}

impl ExactCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self {
            counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Current count of `key`, or `None` if it was never incremented.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts
            .get(key)
            .map(|count| count.load(Ordering::Acquire))
    }

    /// Number of distinct keys tracked.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no key has been counted yet.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    fn lookup(&self, key: &str) -> Option<Arc<AtomicU64>> {
        self.counts.get(key).map(|count| Arc::clone(count.value()))
    }
}

impl Counter for ExactCounter {
    fn inc(&self, key: &str) -> u64 {
        if let Some(count) = self.lookup(key) {
            return count.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        }

        // Re-check under the shard write lock; another thread may have
        // created the entry since the read above.
        let count = match self.counts.entry(Box::from(key)) {
            dashmap::mapref::entry::Entry::Occupied(e) => Arc::clone(e.get()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(Arc::new(AtomicU64::new(1)));
                return 1;
            }
        };
        count.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    fn reset(&self, key: &str) {
        if let Some(count) = self.lookup(key) {
            count.store(0, Ordering::Release);
        }
    }
}
