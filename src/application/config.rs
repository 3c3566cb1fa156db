//! Sampler configuration and construction errors.

use crate::application::counters::{CounterKind, Counters};
use crate::application::ports::ResetScheduler;
use crate::application::sampler::{SamplerHook, SamplingCore};
use crate::domain::policy::{PolicyError, SamplingPolicy};
use crate::infrastructure::scheduler::BackgroundScheduler;
use crate::infrastructure::sharded::{InvalidWidth, DEFAULT_WIDTH};
use std::sync::Arc;
use std::time::Duration;

/// Error returned when building a sampler fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Policy parameters were invalid
    Policy(PolicyError),
    /// Sharded table width is zero or not a multiple of the lock group size
    InvalidTableWidth(usize),
    /// The background reset thread could not be spawned
    SchedulerSpawn(String),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Policy(e) => write!(f, "invalid sampling policy: {}", e),
            BuildError::InvalidTableWidth(width) => write!(f, "{}", InvalidWidth(*width)),
            BuildError::SchedulerSpawn(e) => {
                write!(f, "failed to spawn reset scheduler thread: {}", e)
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Policy(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PolicyError> for BuildError {
    fn from(e: PolicyError) -> Self {
        BuildError::Policy(e)
    }
}

impl From<InvalidWidth> for BuildError {
    fn from(e: InvalidWidth) -> Self {
        BuildError::InvalidTableWidth(e.0)
    }
}

/// Plain sampler settings.
///
/// Defaults: 1 second tick, 100 entries per message forwarded per tick, then
/// every 100th, exact counter. `table_width` (8192 slots by default) only
/// applies when `counter` is `CounterKind::Sharded`.
///
/// With the `serde` feature this can be loaded from application
/// configuration; missing fields take their defaults.
///
/// ```
/// use tracing_sampler::{CounterKind, SamplerConfig};
/// use std::time::Duration;
///
/// let config = SamplerConfig {
///     tick: Duration::from_secs(5),
///     first: 10,
///     counter: CounterKind::Sharded,
///     ..SamplerConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SamplerConfig {
    /// Delay between a message crossing its burst allowance and its count reset
    pub tick: Duration,
    /// Burst allowance per message per tick
    pub first: u64,
    /// Forward every Nth entry once throttled; must be at least 1
    pub thereafter: u64,
    /// Counter table variant
    pub counter: CounterKind,
    /// Slots in the sharded table; ignored by the exact counter
    pub table_width: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            first: 100,
            thereafter: 100,
            counter: CounterKind::Exact,
            table_width: DEFAULT_WIDTH,
        }
    }
}

impl SamplerConfig {
    /// The sampling policy these settings describe.
    ///
    /// # Errors
    /// Returns `PolicyError` for a zero tick or a zero `thereafter`.
    pub fn policy(&self) -> Result<SamplingPolicy, PolicyError> {
        SamplingPolicy::new(self.tick, self.first, self.thereafter)
    }

    /// Check the settings without allocating anything.
    ///
    /// # Errors
    /// Returns the same errors `build` would, apart from scheduler spawning.
    pub fn validate(&self) -> Result<(), BuildError> {
        self.policy()?;
        if self.counter == CounterKind::Sharded
            && (self.table_width == 0
                || self.table_width % crate::infrastructure::sharded::SLOTS_PER_LOCK != 0
                || u32::try_from(self.table_width).is_err())
        {
            return Err(BuildError::InvalidTableWidth(self.table_width));
        }
        Ok(())
    }

    /// Build the shared sampling state.
    ///
    /// Spawns a `BackgroundScheduler` when no scheduler is supplied.
    pub(crate) fn build_core(
        &self,
        scheduler: Option<Arc<dyn ResetScheduler>>,
        hook: Option<SamplerHook>,
    ) -> Result<SamplingCore, BuildError> {
        let policy = self.policy()?;
        let counters = Counters::new(self.counter, self.table_width)?;

        let scheduler = match scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(
                BackgroundScheduler::new()
                    .map_err(|e| BuildError::SchedulerSpawn(e.to_string()))?,
            ),
        };

        let mut core = SamplingCore::new(policy, counters, scheduler);
        if let Some(hook) = hook {
            core = core.with_hook(hook);
        }
        Ok(core)
    }
}
