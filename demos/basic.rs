//! Basic example demonstrating burst-then-every-Nth sampling.
//!
//! The first 3 occurrences of each message within a tick are shown, then
//! only every 5th. After the tick elapses the burst allowance comes back.

use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_sampler::SamplingFilter;
use tracing_subscriber::prelude::*;

fn main() {
    let sampling = SamplingFilter::builder()
        .with_tick(Duration::from_millis(500))
        .with_first(3)
        .with_thereafter(5)
        .build()
        .expect("valid sampling configuration");
    let metrics = sampling.metrics().clone();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(sampling))
        .init();

    println!("=== Basic Sampling Example ===\n");
    println!("Policy: first 3 per message per 500ms, then every 5th\n");

    println!("Emitting 20 identical INFO messages:");
    for i in 1..=20 {
        info!(iteration = i, "This is a repeated log message");
    }

    println!("\nEmitting different messages (each has its own count):");
    for i in 1..=5 {
        warn!(iteration = i, "Message A");
        warn!(iteration = i, "Message B");
    }

    println!("\nWaiting for the tick to elapse...");
    thread::sleep(Duration::from_millis(600));

    println!("Emitting the first message again (burst allowance is back):");
    for i in 1..=5 {
        info!(iteration = i, "This is a repeated log message");
    }

    let snapshot = metrics.snapshot();
    println!("\n=== Example Complete ===");
    println!(
        "Forwarded: {}, dropped: {}, drop rate: {:.0}%",
        snapshot.entries_forwarded,
        snapshot.entries_dropped,
        snapshot.drop_rate() * 100.0
    );
}
