//! The sampling decorator.
//!
//! `SamplingCore` owns everything a sampler tree shares: the policy, the
//! counter table, the reset scheduler and metrics. `Sampler` pairs a core
//! with one wrapped facility and delegates to it only for forwarded entries.

use crate::application::config::{BuildError, SamplerConfig};
use crate::application::counters::{CounterKind, Counters};
use crate::application::metrics::Metrics;
use crate::application::ports::{Counter, Facility, ResetScheduler, ResetTask};
use crate::domain::entry::{Entry, Fields};
use crate::domain::policy::{SamplingDecision, SamplingPolicy};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Callback invoked with every sampled entry and its decision.
///
/// Runs on the logging thread, inline with `check`; keep it cheap.
pub type SamplerHook = Arc<dyn Fn(&Entry, SamplingDecision) + Send + Sync + 'static>;

/// Sampling state shared by a sampler and everything derived from it.
pub struct SamplingCore {
    policy: SamplingPolicy,
    counters: Arc<Counters>,
    scheduler: Arc<dyn ResetScheduler>,
    metrics: Metrics,
    hook: Option<SamplerHook>,
}

impl SamplingCore {
    /// Assemble a core from its parts.
    pub fn new(
        policy: SamplingPolicy,
        counters: Counters,
        scheduler: Arc<dyn ResetScheduler>,
    ) -> Self {
        Self {
            policy,
            counters: Arc::new(counters),
            scheduler,
            metrics: Metrics::new(),
            hook: None,
        }
    }

    /// Attach a hook called for every sampled entry.
    pub fn with_hook(mut self, hook: SamplerHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Count `entry` and decide whether it goes through.
    ///
    /// Arms the key's reset on the hit that first exceeds the burst
    /// allowance. Never fails.
    pub fn sample(&self, entry: &Entry) -> SamplingDecision {
        let key = entry.key();
        let n = self.counters.inc(key);
        let verdict = self.policy.decide(n);

        if verdict.arm_reset {
            let counter: Arc<dyn Counter> = self.counters.clone();
            self.scheduler
                .schedule(self.policy.tick(), ResetTask::new(counter, key));
        }
        self.metrics.record(verdict);

        if let Some(hook) = &self.hook {
            hook(entry, verdict.decision);
        }

        verdict.decision
    }

    /// The sampling policy.
    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// The counter table.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// A shared handle to the counter table.
    ///
    /// Keeps the table alive without keeping the core, and with it the
    /// scheduler, alive.
    pub fn counters_handle(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }

    /// Sampling metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl fmt::Debug for SamplingCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplingCore")
            .field("policy", &self.policy)
            .field("counter", &self.counters.kind())
            .field("scheduler", &self.scheduler)
            .field("metrics", &self.metrics.snapshot())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// A facility that samples entries before handing them to `F`.
///
/// Entries whose level `F` does not enable are passed over without touching
/// the counter. Enabled entries are counted by message; forwarded ones go to
/// `F::check`, dropped ones leave the accumulator unchanged.
///
/// # Example
/// ```
/// use tracing_sampler::{Entry, Facility, Fields, Sampler};
/// use std::time::Duration;
/// use tracing::Level;
///
/// #[derive(Clone)]
/// struct Console;
///
/// impl Facility for Console {
///     type Checked = Vec<String>;
///
///     fn enabled(&self, level: Level) -> bool {
///         level <= Level::INFO
///     }
///
///     fn check(&self, entry: &Entry, mut checked: Vec<String>) -> Vec<String> {
///         checked.push(entry.to_string());
///         checked
///     }
///
///     fn with(&self, _fields: &Fields) -> Self {
///         Console
///     }
/// }
///
/// let sampler = Sampler::new(Console, Duration::from_secs(1), 1, 3).unwrap();
///
/// let entry = Entry::new(Level::INFO, "foo");
/// let written = (0..10).fold(Vec::new(), |acc, _| sampler.check(&entry, acc));
/// assert_eq!(written.len(), 4);
///
/// // Below the console's level: never counted, never written.
/// let noisy = Entry::new(Level::DEBUG, "foo");
/// assert!(sampler.check(&noisy, Vec::new()).is_empty());
/// ```
pub struct Sampler<F> {
    inner: F,
    core: Arc<SamplingCore>,
}

impl<F: Facility> Sampler<F> {
    /// Create a sampler with the default counter and background scheduler.
    ///
    /// # Errors
    /// Returns `BuildError` for invalid parameters or if the scheduler
    /// thread cannot be spawned.
    pub fn new(inner: F, tick: Duration, first: u64, thereafter: u64) -> Result<Self, BuildError> {
        Self::builder(inner)
            .with_tick(tick)
            .with_first(first)
            .with_thereafter(thereafter)
            .build()
    }

    /// Create a builder wrapping `inner`.
    ///
    /// Defaults: 1 second tick, first 100, thereafter 100, exact counter,
    /// background scheduler thread, no hook.
    pub fn builder(inner: F) -> SamplerBuilder<F> {
        SamplerBuilder {
            inner,
            config: SamplerConfig::default(),
            scheduler: None,
            hook: None,
        }
    }

    /// Wrap `inner` around an existing core.
    ///
    /// The new sampler shares counts with every other holder of `core`.
    pub fn from_core(inner: F, core: Arc<SamplingCore>) -> Self {
        Self { inner, core }
    }

    /// The wrapped facility.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// The shared sampling state.
    pub fn core(&self) -> &Arc<SamplingCore> {
        &self.core
    }

    /// Sampling metrics, shared with all derived samplers.
    pub fn metrics(&self) -> &Metrics {
        self.core.metrics()
    }

    /// The sampling policy.
    pub fn policy(&self) -> &SamplingPolicy {
        self.core.policy()
    }
}

impl<F: Facility> Facility for Sampler<F> {
    type Checked = F::Checked;

    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn check(&self, entry: &Entry, checked: Self::Checked) -> Self::Checked {
        if !self.inner.enabled(entry.level) {
            return checked;
        }

        match self.core.sample(entry) {
            SamplingDecision::Forward => self.inner.check(entry, checked),
            SamplingDecision::Drop => checked,
        }
    }

    fn with(&self, fields: &Fields) -> Self {
        Self {
            inner: self.inner.with(fields),
            core: Arc::clone(&self.core),
        }
    }
}

impl<F: Clone> Clone for Sampler<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            core: Arc::clone(&self.core),
        }
    }
}

impl<F: fmt::Debug> fmt::Debug for Sampler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("inner", &self.inner)
            .field("core", &self.core)
            .finish()
    }
}

/// Builder for constructing a `Sampler`.
pub struct SamplerBuilder<F> {
    inner: F,
    config: SamplerConfig,
    scheduler: Option<Arc<dyn ResetScheduler>>,
    hook: Option<SamplerHook>,
}

impl<F: Facility> SamplerBuilder<F> {
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

    /// Forward every `thereafter`-th entry once a message is throttled.
    ///
    /// Zero is rejected by `build`.
    pub fn with_thereafter(mut self, thereafter: u64) -> Self {
        self.config.thereafter = thereafter;
        self
    }

    /// Choose the counter table.
    ///
    /// `CounterKind::Exact` (the default) never collides but keeps one entry
    /// per distinct message forever. `CounterKind::Sharded` uses constant
    /// memory but lets colliding messages share a count. Slots are picked
    /// from the last eight bytes of a message, so pick it only when message
    /// cardinality is unbounded and shared throttling is acceptable.
    pub fn with_counter(mut self, kind: CounterKind) -> Self {
        self.config.counter = kind;
        self
    }

    /// Set the number of slots in the sharded table.
    ///
    /// Must be a non-zero multiple of 8.
    pub fn with_table_width(mut self, width: usize) -> Self {
        self.config.table_width = width;
        self
    }

    /// Replace all settings at once.
    pub fn with_config(mut self, config: SamplerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run resets on `scheduler` instead of a dedicated background thread.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn ResetScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Call `hook` for every sampled entry.
    ///
    /// # Example
    ///
    /// ```
    /// # use tracing_sampler::{Facility, Fields};
    /// # use tracing::Level;
    /// # struct Console;
    /// # impl Facility for Console {
    /// #     type Checked = ();
    /// #     fn enabled(&self, _: Level) -> bool { true }
    /// #     fn check(&self, _: &Entry, _: ()) {}
    /// #     fn with(&self, _: &Fields) -> Self { Console }
    /// # }
    /// use tracing_sampler::{Entry, Sampler, SamplingDecision};
    /// use std::sync::atomic::{AtomicU64, Ordering};
    /// use std::sync::Arc;
    ///
    /// let dropped = Arc::new(AtomicU64::new(0));
    /// let counted = Arc::clone(&dropped);
    ///
    /// let sampler = Sampler::builder(Console)
    ///     .with_first(1)
    ///     .with_thereafter(10)
    ///     .with_hook(Arc::new(move |_entry: &Entry, decision| {
    ///         if decision == SamplingDecision::Drop {
    ///             counted.fetch_add(1, Ordering::Relaxed);
    ///         }
    ///     }))
    ///     .build()
    ///     .unwrap();
    ///
    /// for _ in 0..5 {
    ///     sampler.check(&Entry::new(Level::WARN, "retrying"), ());
    /// }
    /// assert_eq!(dropped.load(Ordering::Relaxed), 4);
    /// ```
    pub fn with_hook(mut self, hook: SamplerHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Build the sampler.
    ///
    /// # Errors
    /// Returns `BuildError` if:
    /// - `thereafter` or the tick is zero
    /// - the sharded table width is invalid
    /// - no scheduler was given and the background thread cannot be spawned
    pub fn build(self) -> Result<Sampler<F>, BuildError> {
        let core = self.config.build_core(self.scheduler, self.hook)?;
        Ok(Sampler {
            inner: self.inner,
            core: Arc::new(core),
        })
    }
}

/// Wrap `facility` in a sampler.
///
/// Forwards the first `first` entries per message per `tick`, then every
/// `thereafter`-th. Uses the exact counter and a background reset thread.
///
/// # Errors
/// Returns `BuildError` if `thereafter` or `tick` is zero, or if the reset
/// thread cannot be spawned.
pub fn sample<F: Facility>(
    facility: F,
    tick: Duration,
    first: u64,
    thereafter: u64,
) -> Result<Sampler<F>, BuildError> {
    Sampler::new(facility, tick, first, thereafter)
}
