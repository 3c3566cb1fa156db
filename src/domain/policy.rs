//! Sampling policy: burst allowance, cadence, and reset tick.
//!
//! The policy is pure. It turns the post-increment count of a key into a
//! forward/drop decision and tells the caller whether this hit should arm the
//! key's reset timer.

use std::num::NonZeroU64;
use std::time::Duration;

/// Decision made for a single sampled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplingDecision {
    /// Hand the entry to the wrapped facility
    Forward,
    /// Discard the entry silently
    Drop,
}

impl SamplingDecision {
    /// Check if this decision is Forward.
    pub fn is_forward(&self) -> bool {
        matches!(self, SamplingDecision::Forward)
    }

    /// Check if this decision is Drop.
    pub fn is_drop(&self) -> bool {
        matches!(self, SamplingDecision::Drop)
    }
}

/// Outcome of [`SamplingPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the entry goes through
    pub decision: SamplingDecision,
    /// True exactly on the hit that first exceeds the burst allowance
    pub arm_reset: bool,
}

/// Error returned when a policy is constructed with invalid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// `thereafter` must be at least 1
    ZeroThereafter,
    /// The reset tick must be longer than zero
    ZeroTick,
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::ZeroThereafter => write!(f, "thereafter must be greater than 0"),
            PolicyError::ZeroTick => write!(f, "tick must be greater than 0"),
        }
    }
}

impl std::error::Error for PolicyError {}

/// Burst-then-every-Nth sampling policy.
///
/// For each key the first `first` hits within a tick are forwarded. After
/// that only every `thereafter`-th hit is forwarded, counting from the hit
/// that crossed the allowance. The key's count is reset `tick` after that
/// crossing.
///
/// # Example
/// ```
/// use tracing_sampler::{SamplingPolicy, SamplingDecision};
/// use std::time::Duration;
///
/// let policy = SamplingPolicy::new(Duration::from_secs(1), 1, 3).unwrap();
///
/// assert_eq!(policy.decide(1).decision, SamplingDecision::Forward);
/// assert_eq!(policy.decide(2).decision, SamplingDecision::Drop);
/// assert!(policy.decide(2).arm_reset);
/// assert_eq!(policy.decide(3).decision, SamplingDecision::Drop);
/// assert_eq!(policy.decide(4).decision, SamplingDecision::Forward);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    tick: Duration,
    first: u64,
    thereafter: NonZeroU64,
}

impl SamplingPolicy {
    /// Create a new policy.
    ///
    /// # Errors
    /// Returns `PolicyError::ZeroThereafter` if `thereafter` is zero and
    /// `PolicyError::ZeroTick` if `tick` is zero.
    pub fn new(tick: Duration, first: u64, thereafter: u64) -> Result<Self, PolicyError> {
        if tick.is_zero() {
            return Err(PolicyError::ZeroTick);
        }
        let thereafter = NonZeroU64::new(thereafter).ok_or(PolicyError::ZeroThereafter)?;
        Ok(Self {
            tick,
            first,
            thereafter,
        })
    }

    /// Burst allowance.
    pub fn first(&self) -> u64 {
        self.first
    }

    /// Cadence once throttled.
    pub fn thereafter(&self) -> u64 {
        self.thereafter.get()
    }

    /// Delay between crossing the allowance and the count reset.
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Decide what to do with the `n`th hit of a key.
    ///
    /// `n` is the count after the increment, so the first hit is `n == 1`.
    #[inline]
    pub fn decide(&self, n: u64) -> Verdict {
        if n <= self.first {
            return Verdict {
                decision: SamplingDecision::Forward,
                arm_reset: false,
            };
        }

        let over = n - self.first;
        let decision = if over % self.thereafter.get() == 0 {
            SamplingDecision::Forward
        } else {
            SamplingDecision::Drop
        };

        Verdict {
            decision,
            arm_reset: over == 1,
        }
    }
}
