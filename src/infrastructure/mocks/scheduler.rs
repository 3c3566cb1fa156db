//! Mock reset scheduler for testing.

use crate::application::ports::{ResetScheduler, ResetTask};
use std::sync::Mutex;
use std::time::Duration;

/// Reset scheduler driven by virtual time.
///
/// Nothing fires on its own. Tests move time forward with `advance`, which
/// runs every task whose deadline has been reached, in deadline order.
///
/// # Examples
///
/// ```
/// use tracing_sampler::infrastructure::mocks::MockScheduler;
/// use tracing_sampler::{Counter, ExactCounter, ResetScheduler, ResetTask};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let counter = Arc::new(ExactCounter::new());
/// counter.inc("foo");
///
/// let scheduler = MockScheduler::new();
/// scheduler.schedule(Duration::from_secs(1), ResetTask::new(counter.clone(), "foo"));
///
/// assert_eq!(scheduler.advance(Duration::from_millis(999)), 0);
/// assert_eq!(counter.get("foo"), Some(1));
///
/// assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
/// assert_eq!(counter.get("foo"), Some(0));
/// ```
#[derive(Debug, Default)]
pub struct MockScheduler {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    elapsed: Duration,
    seq: u64,
    pending: Vec<Scheduled>,
}

#[derive(Debug)]
struct Scheduled {
    deadline: Duration,
    seq: u64,
    task: ResetTask,
}

impl MockScheduler {
    /// Create a scheduler at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward by `by` and run every task now due.
    ///
    /// Returns the number of tasks fired. Tasks run after the internal lock
    /// is released, so they may schedule again.
    pub fn advance(&self, by: Duration) -> usize {
        let due = {
            let mut state = self.lock();
            state.elapsed = state.elapsed.saturating_add(by);
            let now = state.elapsed;
            take_where(&mut state.pending, |s| s.deadline <= now)
        };
        fire(due)
    }

    /// Run every pending task regardless of deadline.
    pub fn fire_all(&self) -> usize {
        let due = std::mem::take(&mut self.lock().pending);
        fire(due)
    }

    /// Number of tasks waiting to fire.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .expect("MockScheduler mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl ResetScheduler for MockScheduler {
    fn schedule(&self, after: Duration, task: ResetTask) {
        let mut state = self.lock();
        let deadline = state.elapsed.saturating_add(after);
        let seq = state.seq;
        state.seq += 1;
        state.pending.push(Scheduled {
            deadline,
            seq,
            task,
        });
    }
}

fn take_where(pending: &mut Vec<Scheduled>, due: impl Fn(&Scheduled) -> bool) -> Vec<Scheduled> {
    let (ready, waiting) = std::mem::take(pending).into_iter().partition(|s| due(s));
    *pending = waiting;
    ready
}

fn fire(mut due: Vec<Scheduled>) -> usize {
    due.sort_by_key(|s| (s.deadline, s.seq));
    let fired = due.len();
    for scheduled in due {
        scheduled.task.fire();
    }
    fired
}
