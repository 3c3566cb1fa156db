//! Tracing integration layer.
//!
//! Provides a `tracing_subscriber` per-layer `Filter` that samples events by
//! message text, so repetitive events are thinned out before they reach the
//! layer it is attached to.

use crate::application::config::{BuildError, SamplerConfig};
use crate::application::counters::CounterKind;
use crate::application::metrics::Metrics;
use crate::application::ports::ResetScheduler;
use crate::application::sampler::{SamplerHook, SamplingCore};
use crate::domain::entry::Entry;
use crate::infrastructure::visitor::MessageVisitor;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter};

/// Builder for constructing a `SamplingFilter`.
pub struct SamplingFilterBuilder {
    config: SamplerConfig,
    max_level: LevelFilter,
    scheduler: Option<Arc<dyn ResetScheduler>>,
    hook: Option<SamplerHook>,
}

impl SamplingFilterBuilder {
    /// Set the reset tick.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.config.tick = tick;
        self
    }

    /// Set the burst allowance per message per tick.
    pub fn with_first(mut self, first: u64) -> Self {
        self.config.first = first;
        self
    }

    /// Forward every `thereafter`-th event once a message is throttled.
    pub fn with_thereafter(mut self, thereafter: u64) -> Self {
        self.config.thereafter = thereafter;
        self
    }

    /// Choose the counter table. See `CounterKind`.
    pub fn with_counter(mut self, kind: CounterKind) -> Self {
        self.config.counter = kind;
        self
    }

    /// Set the number of slots in the sharded table.
    pub fn with_table_width(mut self, width: usize) -> Self {
        self.config.table_width = width;
        self
    }

    /// Replace all sampling settings at once.
    pub fn with_config(mut self, config: SamplerConfig) -> Self {
        self.config = config;
        self
    }

    /// Reject callsites more verbose than `level` before they are counted.
    ///
    /// Defaults to `LevelFilter::TRACE`, i.e. every event is sampled.
    pub fn with_max_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.max_level = level.into();
        self
    }

    /// Run resets on `scheduler` instead of a dedicated background thread.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn ResetScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Call `hook` for every sampled event.
    pub fn with_hook(mut self, hook: SamplerHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Build the filter.
    ///
    /// # Errors
    /// Returns `BuildError` if the sampling settings are invalid or the
    /// background reset thread cannot be spawned.
    pub fn build(self) -> Result<SamplingFilter, BuildError> {
        let core = self.config.build_core(self.scheduler, self.hook)?;
        Ok(SamplingFilter {
            core: Arc::new(core),
            max_level: self.max_level,
        })
    }
}

/// Per-layer filter that samples `tracing` events.
///
/// Each event is keyed on its formatted `message` field (the callsite name
/// when there is none). Structured fields and spans do not affect the key,
/// so `info!(user = 1, "login")` and `info!(user = 2, "login")` share one
/// count.
///
/// Clones share sampling state.
///
/// # Example
///
/// ```rust,no_run
/// use tracing_sampler::SamplingFilter;
/// use tracing_subscriber::prelude::*;
/// use std::time::Duration;
///
/// let sampling = SamplingFilter::builder()
///     .with_tick(Duration::from_secs(1))
///     .with_first(100)
///     .with_thereafter(100)
///     .build()
///     .unwrap();
///
/// tracing_subscriber::registry()
///     .with(tracing_subscriber::fmt::layer().with_filter(sampling))
///     .init();
/// ```
#[derive(Debug, Clone)]
pub struct SamplingFilter {
    core: Arc<SamplingCore>,
    max_level: LevelFilter,
}

impl SamplingFilter {
    /// Create a builder.
    ///
    /// Defaults: 1 second tick, first 100, thereafter 100, exact counter,
    /// every level sampled.
    pub fn builder() -> SamplingFilterBuilder {
        SamplingFilterBuilder {
            config: SamplerConfig::default(),
            max_level: LevelFilter::TRACE,
            scheduler: None,
            hook: None,
        }
    }

    /// Create a filter with default settings.
    ///
    /// # Errors
    /// Returns `BuildError::SchedulerSpawn` if the background reset thread
    /// cannot be spawned.
    pub fn new() -> Result<Self, BuildError> {
        Self::builder().build()
    }

    /// Create a filter sharing `core` with other samplers.
    pub fn from_core(core: Arc<SamplingCore>) -> Self {
        Self {
            core,
            max_level: LevelFilter::TRACE,
        }
    }

    /// The shared sampling state.
    pub fn core(&self) -> &Arc<SamplingCore> {
        &self.core
    }

    /// Sampling metrics.
    pub fn metrics(&self) -> &Metrics {
        self.core.metrics()
    }

    /// The most verbose level this filter lets through to sampling.
    pub fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    fn entry_for(event: &tracing::Event<'_>) -> Entry {
        let meta = event.metadata();
        let message = MessageVisitor::extract(event)
            .map(Cow::Owned)
            .unwrap_or(Cow::Borrowed(meta.name()));
        Entry::new(*meta.level(), message).with_target(Cow::Borrowed(meta.target()))
    }
}

impl<S: Subscriber> Filter<S> for SamplingFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        *meta.level() <= self.max_level
    }

    fn event_enabled(&self, event: &tracing::Event<'_>, _cx: &Context<'_, S>) -> bool {
        self.core.sample(&Self::entry_for(event)).is_forward()
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(self.max_level)
    }
}
