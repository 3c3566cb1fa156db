//! Counter strategy selection.
//!
//! The sampler works with either counter table. The choice between bounded
//! memory (sharded, collision tolerant) and exact accounting (one entry per
//! distinct message, unbounded) is made explicitly at construction time.

use crate::application::ports::Counter;
use crate::infrastructure::exact::ExactCounter;
use crate::infrastructure::sharded::{InvalidWidth, ShardedCounter};

/// Which counter table a sampler uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CounterKind {
    /// One independent count per distinct message; memory grows with
    /// message cardinality
    #[default]
    Exact,
    /// Fixed-size lock-striped table; keys may collide and share a count.
    /// Opt in when bounded memory matters more than per-message accuracy.
    Sharded,
}

/// A counter table, one of the two concrete variants.
#[derive(Debug)]
pub enum Counters {
    /// Approximate, constant memory
    Sharded(ShardedCounter),
    /// Exact, unbounded memory
    Exact(ExactCounter),
}

impl Counters {
    /// Create a table of the given kind.
    ///
    /// `width` is only used by the sharded table.
    ///
    /// # Errors
    /// Returns `InvalidWidth` if a sharded table is requested with a width
    /// that is not a non-zero multiple of the lock group size.
    pub fn new(kind: CounterKind, width: usize) -> Result<Self, InvalidWidth> {
        match kind {
            CounterKind::Sharded => ShardedCounter::with_width(width).map(Counters::Sharded),
            CounterKind::Exact => Ok(Counters::Exact(ExactCounter::new())),
        }
    }

    /// Create a sharded table with the default width.
    pub fn sharded() -> Self {
        Counters::Sharded(ShardedCounter::new())
    }

    /// Create an exact table.
    pub fn exact() -> Self {
        Counters::Exact(ExactCounter::new())
    }

    /// The kind of this table.
    pub fn kind(&self) -> CounterKind {
        match self {
            Counters::Sharded(_) => CounterKind::Sharded,
            Counters::Exact(_) => CounterKind::Exact,
        }
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::exact()
    }
}

impl Counter for Counters {
    #[inline]
    fn inc(&self, key: &str) -> u64 {
        match self {
            Counters::Sharded(c) => c.inc(key),
            Counters::Exact(c) => c.inc(key),
        }
    }

    #[inline]
    fn reset(&self, key: &str) {
        match self {
            Counters::Sharded(c) => c.reset(key),
            Counters::Exact(c) => c.reset(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kind_is_exact() {
        assert_eq!(CounterKind::default(), CounterKind::Exact);
        assert_eq!(Counters::default().kind(), CounterKind::Exact);
    }

    #[test]
    fn test_new_by_kind() {
        let sharded = Counters::new(CounterKind::Sharded, 64).unwrap();
        assert_eq!(sharded.kind(), CounterKind::Sharded);

        let exact = Counters::new(CounterKind::Exact, 0).unwrap();
        assert_eq!(exact.kind(), CounterKind::Exact);
    }

    #[test]
    fn test_invalid_width_only_matters_for_sharded() {
        assert_eq!(
            Counters::new(CounterKind::Sharded, 10).unwrap_err(),
            InvalidWidth(10)
        );
        assert!(Counters::new(CounterKind::Exact, 10).is_ok());
    }

    #[test]
    fn test_dispatch() {
        for counters in [Counters::sharded(), Counters::exact()] {
            assert_eq!(counters.inc("connection refused"), 1);
            assert_eq!(counters.inc("connection refused"), 2);
            counters.reset("connection refused");
            assert_eq!(counters.inc("connection refused"), 1);
        }
    }

    #[test]
    fn test_collision_behavior_differs() {
        let sharded = Counters::sharded();
        let exact = Counters::exact();

        sharded.inc("foo");
        exact.inc("foo");

        assert_eq!(sharded.inc("bar"), 2);
        assert_eq!(exact.inc("bar"), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_kind_serde_names() {
        let kind: CounterKind = serde_json::from_str("\"exact\"").unwrap();
        assert_eq!(kind, CounterKind::Exact);
        assert_eq!(serde_json::to_string(&CounterKind::Sharded).unwrap(), "\"sharded\"");
    }
}
