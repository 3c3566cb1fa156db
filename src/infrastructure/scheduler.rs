//! Reset scheduler adapters.
//!
//! Provides `BackgroundScheduler` (a dedicated timer thread) for production
//! use and, with the `async` feature, `TokioScheduler` for applications that
//! already run a tokio runtime.
//!
//! # Testing
//!
//! See `MockScheduler` (in `crate::infrastructure::mocks`) for a scheduler
//! driven by virtual time. Available with the `test-helpers` feature or in
//! test builds.

use crate::application::ports::{ResetScheduler, ResetTask};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

const THREAD_NAME: &str = "tracing-sampler-reset";

struct Pending {
    deadline: Instant,
    task: ResetTask,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline.cmp(&other.deadline)
    }
}

/// Runs resets on one dedicated background thread.
///
/// Scheduling sends the task over a channel; the thread keeps pending tasks
/// in a min-heap ordered by deadline and sleeps until the earliest one is
/// due. Arming a reset therefore costs one channel send on the caller's
/// thread.
///
/// When every handle to the scheduler has been dropped, the thread still
/// fires the tasks already queued (they hold the counter table alive) and
/// then exits.
pub struct BackgroundScheduler {
    sender: Sender<Pending>,
}

impl BackgroundScheduler {
    /// Spawn the scheduler thread.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be spawned.
    pub fn new() -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(receiver))?;

        tracing::debug!(thread = THREAD_NAME, "reset scheduler started");
        Ok(Self { sender })
    }
}

impl fmt::Debug for BackgroundScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundScheduler")
            .field("thread", &THREAD_NAME)
            .finish()
    }
}

impl ResetScheduler for BackgroundScheduler {
    fn schedule(&self, after: Duration, task: ResetTask) {
        // A tick too large to represent never elapses.
        let Some(deadline) = Instant::now().checked_add(after) else {
            return;
        };
        // The thread only stops once every sender is gone, so this cannot
        // fail while `self` is alive.
        let _ = self.sender.send(Pending { deadline, task });
    }
}

fn fire_due(queue: &mut BinaryHeap<Reverse<Pending>>, now: Instant) {
    while let Some(Reverse(next)) = queue.peek() {
        if next.deadline > now {
            break;
        }
        if let Some(Reverse(due)) = queue.pop() {
            due.task.fire();
        }
    }
}

fn run(receiver: Receiver<Pending>) {
    let mut queue: BinaryHeap<Reverse<Pending>> = BinaryHeap::new();

    loop {
        let now = Instant::now();
        fire_due(&mut queue, now);

        let received = match queue.peek() {
            Some(Reverse(next)) => receiver.recv_timeout(next.deadline.saturating_duration_since(now)),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(pending) => queue.push(Reverse(pending)),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if !queue.is_empty() {
        tracing::trace!(pending = queue.len(), "flushing resets after sampler drop");
    }
    while let Some(Reverse(pending)) = queue.pop() {
        let wait = pending.deadline.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
        }
        pending.task.fire();
    }

    tracing::debug!(thread = THREAD_NAME, "reset scheduler stopped");
}

/// Runs each reset as a task on a tokio runtime.
///
/// **Requires the `async` feature.**
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "async")]
impl TokioScheduler {
    /// Schedule onto the runtime behind `handle`.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Schedule onto the runtime of the calling context, if there is one.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

#[cfg(feature = "async")]
impl ResetScheduler for TokioScheduler {
    fn schedule(&self, after: Duration, task: ResetTask) {
        self.handle.spawn(async move {
            tokio::time::sleep(after).await;
            task.fire();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Counter;
    use crate::infrastructure::exact::ExactCounter;
    use std::sync::Arc;

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_pending_ordering() {
        let counter: Arc<dyn Counter> = Arc::new(ExactCounter::new());
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        for ms in [30, 10, 20] {
            heap.push(Reverse(Pending {
                deadline: now + Duration::from_millis(ms),
                task: ResetTask::new(counter.clone(), format!("{}", ms)),
            }));
        }

        let order: Vec<String> = std::iter::from_fn(|| heap.pop())
            .map(|Reverse(p)| p.task.key().to_string())
            .collect();
        assert_eq!(order, vec!["10", "20", "30"]);
    }

    #[test]
    fn test_fire_due_leaves_future_tasks() {
        let counter = Arc::new(ExactCounter::new());
        counter.inc("due");
        counter.inc("later");

        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(Pending {
            deadline: now,
            task: ResetTask::new(counter.clone(), "due"),
        }));
        heap.push(Reverse(Pending {
            deadline: now + Duration::from_secs(60),
            task: ResetTask::new(counter.clone(), "later"),
        }));

        fire_due(&mut heap, now);

        assert_eq!(heap.len(), 1);
        assert_eq!(counter.get("due"), Some(0));
        assert_eq!(counter.get("later"), Some(1));
    }

    #[test]
    fn test_background_reset_fires() {
        let counter = Arc::new(ExactCounter::new());
        counter.inc("k");
        counter.inc("k");

        let scheduler = BackgroundScheduler::new().unwrap();
        scheduler.schedule(
            Duration::from_millis(20),
            ResetTask::new(counter.clone(), "k"),
        );

        assert!(wait_for(|| counter.get("k") == Some(0)));
    }

    #[test]
    fn test_pending_resets_fire_after_scheduler_dropped() {
        let counter = Arc::new(ExactCounter::new());
        counter.inc("k");

        let scheduler = BackgroundScheduler::new().unwrap();
        scheduler.schedule(
            Duration::from_millis(30),
            ResetTask::new(counter.clone(), "k"),
        );
        drop(scheduler);

        assert!(wait_for(|| counter.get("k") == Some(0)));
    }

    #[test]
    fn test_unrepresentable_tick_never_fires() {
        let counter = Arc::new(ExactCounter::new());
        counter.inc("k");

        let scheduler = BackgroundScheduler::new().unwrap();
        scheduler.schedule(Duration::MAX, ResetTask::new(counter.clone(), "k"));

        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.get("k"), Some(1));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_tokio_scheduler_fires() {
        let counter = Arc::new(ExactCounter::new());
        counter.inc("k");

        let scheduler = TokioScheduler::current().expect("inside a runtime");
        scheduler.schedule(
            Duration::from_millis(20),
            ResetTask::new(counter.clone(), "k"),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.get("k"), Some(0));
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_tokio_scheduler_absent_outside_runtime() {
        assert!(TokioScheduler::current().is_none());
    }
}
