#![cfg(feature = "async")]

use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_sampler::{
    Counter, Counters, Entry, ExactCounter, Facility, Fields, ResetScheduler, ResetTask, Sampler,
    TokioScheduler,
};

#[derive(Clone)]
struct Sink;

impl Facility for Sink {
    type Checked = usize;

    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn check(&self, _entry: &Entry, written: usize) -> usize {
        written + 1
    }

    fn with(&self, _fields: &Fields) -> Self {
        Sink
    }
}

#[tokio::test]
async fn test_tokio_scheduler_fires_reset() {
    let counter = Arc::new(ExactCounter::new());
    counter.inc("k");
    counter.inc("k");

    let scheduler = TokioScheduler::current().expect("inside a runtime");
    scheduler.schedule(Duration::from_millis(20), ResetTask::new(counter.clone(), "k"));

    assert_eq!(counter.get("k"), Some(2));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.get("k"), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sampler_on_tokio_runtime() {
    let sampler = Sampler::builder(Sink)
        .with_tick(Duration::from_millis(50))
        .with_first(1)
        .with_thereafter(1000)
        .with_scheduler(Arc::new(TokioScheduler::new(tokio::runtime::Handle::current())))
        .build()
        .unwrap();

    let entry = Entry::new(Level::INFO, "tick");
    assert_eq!(sampler.check(&entry, 0), 1);
    assert_eq!(sampler.check(&entry, 0), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(sampler.check(&entry, 0), 1);
    assert!(matches!(sampler.core().counters(), Counters::Exact(_)));
}

#[test]
fn test_no_runtime_no_scheduler() {
    assert!(TokioScheduler::current().is_none());
}
