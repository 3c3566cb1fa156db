//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports, and the wrapped
//! logging facility is supplied by the caller.

use crate::domain::entry::{Entry, Fields};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Port for the per-key frequency counter.
///
/// Both operations are total: they never fail and hold any internal lock only
/// for a single in-memory read-modify-write. Infrastructure provides the
/// concrete tables (`ShardedCounter`, `ExactCounter`).
pub trait Counter: Send + Sync + Debug {
    /// Increment the count of `key` and return the new value.
    fn inc(&self, key: &str) -> u64;

    /// Set the count of `key` back to zero.
    fn reset(&self, key: &str);
}

/// The logging capability a sampler wraps.
///
/// This is the narrow surface the sampler needs from the rest of a logging
/// pipeline: level filtering, entry checking, and attaching context. The
/// encoder and output sink live behind it.
pub trait Facility {
    /// Accumulator threaded through `check`, e.g. the set of writers that
    /// accepted the entry.
    type Checked;

    /// Whether entries at `level` would be written at all.
    fn enabled(&self, level: Level) -> bool;

    /// Add this facility to `checked` if it wants to write `entry`.
    fn check(&self, entry: &Entry, checked: Self::Checked) -> Self::Checked;

    /// Derive a facility that attaches `fields` to everything it writes.
    fn with(&self, fields: &Fields) -> Self
    where
        Self: Sized;
}

/// A pending count reset for one key.
///
/// Holds the counter by shared handle, so the task stays valid after the
/// `check` call that armed it has returned and even after the sampler that
/// armed it has been dropped.
#[derive(Debug)]
pub struct ResetTask {
    counter: Arc<dyn Counter>,
    key: Box<str>,
}

impl ResetTask {
    /// Create a task that resets `key` in `counter`.
    pub fn new(counter: Arc<dyn Counter>, key: impl Into<Box<str>>) -> Self {
        Self {
            counter,
            key: key.into(),
        }
    }

    /// The key this task will reset.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run the reset. Resetting an already-zero count is harmless.
    pub fn fire(self) {
        self.counter.reset(&self.key);
    }
}

/// Port for deferred execution of count resets.
///
/// Implementations run the task on a context other than the caller's, at
/// least `after` from now. Scheduled tasks cannot be cancelled.
/// Infrastructure provides `BackgroundScheduler` and, with the `async`
/// feature, `TokioScheduler`.
pub trait ResetScheduler: Send + Sync + Debug {
    /// Run `task` once `after` has elapsed.
    fn schedule(&self, after: Duration, task: ResetTask);
}
