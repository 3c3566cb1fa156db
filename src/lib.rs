//! # tracing-sampler
//!
//! Burst-then-every-Nth sampling of repetitive log events for the `tracing` ecosystem.
//!
//! For each distinct message, the first `first` occurrences within a tick are let
//! through unconditionally. After that only every `thereafter`-th occurrence gets
//! through, until the message's count is reset `tick` after it first crossed the
//! burst allowance. The count is then back at zero and the burst allowance is
//! available again.
//!
//! The sampling key is the **message text only**. Levels, targets, fields and spans
//! never split a key, which keeps the per-event cost to one hash and one short lock.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tracing_sampler::SamplingFilter;
//! use tracing_subscriber::prelude::*;
//! use std::time::Duration;
//!
//! // 100 per message per second, then every 100th
//! let sampling = SamplingFilter::new().unwrap();
//!
//! // Or customize:
//! let sampling = SamplingFilter::builder()
//!     .with_tick(Duration::from_secs(5))
//!     .with_first(10)
//!     .with_thereafter(50)
//!     .build()
//!     .unwrap();
//!
//! // Apply the sampler as a filter to your fmt layer
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer().with_filter(sampling))
//!     .init();
//! ```
//!
//! ## Wrapping Your Own Pipeline
//!
//! Pipelines that are not built on `tracing_subscriber` can implement [`Facility`]
//! and wrap it in a [`Sampler`]. The sampler asks the facility whether a level is
//! enabled before counting, so filtered-out entries cost nothing:
//!
//! ```rust
//! use tracing_sampler::{sample, Entry, Facility, Fields};
//! use std::time::Duration;
//! use tracing::Level;
//!
//! struct Stderr;
//!
//! impl Facility for Stderr {
//!     type Checked = bool;
//!
//!     fn enabled(&self, level: Level) -> bool {
//!         level <= Level::WARN
//!     }
//!
//!     fn check(&self, entry: &Entry, _written: bool) -> bool {
//!         eprintln!("{}", entry);
//!         true
//!     }
//!
//!     fn with(&self, _fields: &Fields) -> Self {
//!         Stderr
//!     }
//! }
//!
//! let sampler = sample(Stderr, Duration::from_secs(1), 1, 3).unwrap();
//! let entry = Entry::new(Level::ERROR, "connection refused");
//!
//! let written: Vec<bool> = (0..4).map(|_| sampler.check(&entry, false)).collect();
//! assert_eq!(written, vec![true, false, false, true]);
//! ```
//!
//! Facilities derived with [`Facility::with`] share the parent's counters: attaching
//! fields never resets or splits a message's count.
//!
//! ## Choosing a Counter
//!
//! Two counter tables are available, selected with [`CounterKind`]:
//!
//! | Kind | Memory | Accuracy |
//! |------|--------|----------|
//! | `Exact` (default) | One entry per distinct message ever seen, never evicted | Exact per message |
//! | `Sharded` | Constant, 64 KiB of counts at 8192 slots | Messages that hash to the same slot share a count |
//!
//! Every distinct message gets its own count unless you opt out. The sharded
//! table places a message by its last eight bytes, so `"backend-1 unavailable"`
//! and `"backend-2 unavailable"` are throttled together, as are all messages of
//! three bytes or fewer. Opt in when the set of messages is unbounded (for
//! example, messages with ids interpolated) and shared throttling is acceptable:
//!
//! ```rust,no_run
//! # use tracing_sampler::{CounterKind, SamplingFilter};
//! let sampling = SamplingFilter::builder()
//!     .with_counter(CounterKind::Sharded)
//!     .with_table_width(16384)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Configuration
//!
//! All sampling settings live in [`SamplerConfig`]. With the `serde` feature it can be
//! deserialized from application configuration; missing fields take their defaults.
//!
//! ```rust,no_run
//! # use tracing_sampler::{SamplerConfig, SamplingFilter};
//! let config = SamplerConfig {
//!     first: 20,
//!     ..SamplerConfig::default()
//! };
//! let sampling = SamplingFilter::builder().with_config(config).build().unwrap();
//! ```
//!
//! ## Reset Scheduling
//!
//! Resets run off the logging thread. By default every sampler tree gets one
//! [`BackgroundScheduler`] thread. With the `async` feature, `TokioScheduler` runs
//! resets as tasks on an existing runtime instead. Armed resets cannot be
//! cancelled; dropping a sampler leaves them to fire harmlessly.
//!
//! ## Observability
//!
//! Monitor sampling with built-in metrics, or observe each decision with a hook:
//!
//! ```rust,no_run
//! # use tracing_sampler::{Entry, SamplingDecision, SamplingFilter};
//! # use std::sync::Arc;
//! let sampling = SamplingFilter::builder()
//!     .with_hook(Arc::new(|entry: &Entry, decision| {
//!         if decision == SamplingDecision::Drop {
//!             eprintln!("dropped {} entry", entry.level);
//!         }
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let metrics = sampling.metrics();
//! println!("Entries forwarded: {}", metrics.entries_forwarded());
//! println!("Entries dropped: {}", metrics.entries_dropped());
//!
//! let snapshot = metrics.snapshot();
//! println!("Drop rate: {:.2}%", snapshot.drop_rate() * 100.0);
//! ```
//!
//! ## Features
//!
//! - `async`: `TokioScheduler`
//! - `serde`: `Serialize`/`Deserialize` for `SamplerConfig` and `CounterKind`
//! - `test-helpers`: mocks in `infrastructure::mocks` (always on for this crate's own tests and demos)

// Domain layer - pure sampling logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    entry::{Entry, Fields},
    policy::{PolicyError, SamplingDecision, SamplingPolicy, Verdict},
};

pub use application::{
    config::{BuildError, SamplerConfig},
    counters::{CounterKind, Counters},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Counter, Facility, ResetScheduler, ResetTask},
    sampler::{sample, Sampler, SamplerBuilder, SamplerHook, SamplingCore},
};

pub use infrastructure::{
    exact::ExactCounter,
    layer::{SamplingFilter, SamplingFilterBuilder},
    scheduler::BackgroundScheduler,
    sharded::{InvalidWidth, ShardedCounter},
};

#[cfg(feature = "async")]
pub use infrastructure::scheduler::TokioScheduler;
