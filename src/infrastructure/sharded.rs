//! Fixed-size, lock-striped counter table.
//!
//! Keys are placed into one of `width` slots by [`slot_hash`]. Slots are
//! grouped eight to a lock, so one group of `u64` counts fills a cache line
//! and unrelated keys rarely contend. Memory use is constant (64 KiB of
//! counts at the default width) no matter how many distinct keys are seen.
//!
//! Keys that land in the same slot share one count. This is the accepted
//! price of bounded memory; use `ExactCounter` where per-key accuracy matters.

use crate::application::ports::Counter;
use crate::domain::hash::slot_hash;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Counters guarded by each lock. Eight `u64`s fit in a 64-byte cache line.
pub const SLOTS_PER_LOCK: usize = 8;

/// Default number of slots in the table.
pub const DEFAULT_WIDTH: usize = 8192;

const BUCKET_MASK: u32 = SLOTS_PER_LOCK as u32 - 1;

/// Error returned for a table width that cannot be split into lock groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidWidth(pub usize);

impl fmt::Display for InvalidWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table width {} must be a non-zero multiple of {} and fit in 32 bits",
            self.0, SLOTS_PER_LOCK
        )
    }
}

impl std::error::Error for InvalidWidth {}

#[repr(align(64))]
#[derive(Default)]
struct Bucket {
    counts: Mutex<[u64; SLOTS_PER_LOCK]>,
}

impl Bucket {
    #[inline]
    fn inc(&self, slot: usize) -> u64 {
        // No code path panics while holding this lock, so poison carries no
        // meaning here and the counts stay usable.
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        let n = counts[slot].wrapping_add(1);
        counts[slot] = n;
        n
    }

    #[inline]
    fn reset(&self, slot: usize) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts[slot] = 0;
    }

    fn get(&self, slot: usize) -> u64 {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)[slot]
    }
}

/// Approximate per-key counter with constant memory.
///
/// # Example
/// ```
/// use tracing_sampler::{Counter, ShardedCounter};
///
/// let counter = ShardedCounter::new();
/// assert_eq!(counter.inc("connection refused"), 1);
/// assert_eq!(counter.inc("connection refused"), 2);
///
/// counter.reset("connection refused");
/// assert_eq!(counter.inc("connection refused"), 1);
/// ```
pub struct ShardedCounter {
    buckets: Box<[Bucket]>,
    width: u32,
}

impl ShardedCounter {
    /// Create a table with [`DEFAULT_WIDTH`] slots.
    pub fn new() -> Self {
        Self::build(DEFAULT_WIDTH as u32)
    }

    /// Create a table with `width` slots.
    ///
    /// # Errors
    /// Returns `InvalidWidth` unless `width` is a non-zero multiple of
    /// [`SLOTS_PER_LOCK`] that fits in a `u32`.
    pub fn with_width(width: usize) -> Result<Self, InvalidWidth> {
        if width == 0 || width % SLOTS_PER_LOCK != 0 {
            return Err(InvalidWidth(width));
        }
        let width32 = u32::try_from(width).map_err(|_| InvalidWidth(width))?;
        Ok(Self::build(width32))
    }

    fn build(width: u32) -> Self {
        let locks = width as usize / SLOTS_PER_LOCK;
        let buckets = (0..locks).map(|_| Bucket::default()).collect();
        Self { buckets, width }
    }

    /// Number of slots.
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// Number of locks guarding the slots.
    pub fn lock_count(&self) -> usize {
        self.buckets.len()
    }

    /// Slot index that `key` maps to.
    pub fn slot_of(&self, key: &str) -> usize {
        slot_hash(key, self.width) as usize
    }

    /// Current count of the slot `key` maps to, without incrementing.
    pub fn get(&self, key: &str) -> u64 {
        let (bucket, slot) = self.locate(key);
        bucket.get(slot)
    }

    #[inline]
    fn locate(&self, key: &str) -> (&Bucket, usize) {
        let i = slot_hash(key, self.width);
        let bucket = &self.buckets[(i / SLOTS_PER_LOCK as u32) as usize];
        (bucket, (i & BUCKET_MASK) as usize)
    }
}

impl Default for ShardedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShardedCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCounter")
            .field("width", &self.width)
            .field("locks", &self.buckets.len())
            .finish()
    }
}

impl Counter for ShardedCounter {
    #[inline]
    fn inc(&self, key: &str) -> u64 {
        let (bucket, slot) = self.locate(key);
        bucket.inc(slot)
    }

    #[inline]
    fn reset(&self, key: &str) {
        let (bucket, slot) = self.locate(key);
        bucket.reset(slot);
    }
}
