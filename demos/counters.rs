//! Example comparing the sharded and exact counter tables.
//!
//! Two messages that end in the same eight bytes land in one slot of the
//! sharded table and are throttled together. The exact table keeps them
//! apart at the cost of one map entry per distinct message.
//!
//! Uses the mocks from `infrastructure::mocks`, which dev builds enable:
//! `cargo run --example counters`.

use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_sampler::infrastructure::mocks::{MockScheduler, RecordingFacility};
use tracing_sampler::{CounterKind, Entry, Facility, Sampler};

fn run(kind: CounterKind) {
    let facility = RecordingFacility::new();
    let scheduler = Arc::new(MockScheduler::new());
    let sampler = Sampler::builder(facility.clone())
        .with_tick(Duration::from_secs(1))
        .with_first(2)
        .with_thereafter(10)
        .with_counter(kind)
        .with_scheduler(scheduler.clone())
        .build()
        .expect("valid sampling configuration");

    for _ in 0..5 {
        sampler.check(&Entry::new(Level::ERROR, "xxxxxxxx-timeout"), Vec::new());
        sampler.check(&Entry::new(Level::ERROR, "yyyyyyyy-timeout"), Vec::new());
    }

    println!("{:?} counter:", kind);
    for message in facility.messages() {
        println!("  written: {}", message);
    }
    println!("  resets armed: {}", scheduler.pending());

    scheduler.advance(Duration::from_secs(1));
    facility.clear();
    sampler.check(&Entry::new(Level::ERROR, "yyyyyyyy-timeout"), Vec::new());
    println!("  after one tick, next hit written: {}\n", facility.count() == 1);
}

fn main() {
    println!("=== Counter Comparison Example ===\n");
    run(CounterKind::Sharded);
    run(CounterKind::Exact);
}
