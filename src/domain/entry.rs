//! Log entries as seen by the sampler.
//!
//! The sampler only reads two things from an entry: its level (to ask the
//! wrapped facility whether it is enabled) and its message (the sampling
//! key). Everything else travels through untouched.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use tracing::Level;

/// Structured context attached to a facility through `with`.
///
/// Fields never influence sampling; only the message text does.
pub type Fields = BTreeMap<Cow<'static, str>, Cow<'static, str>>;

/// A single log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Severity
    pub level: Level,
    /// Message text, used as the sampling key
    pub message: Cow<'static, str>,
    /// Originating module path or logger name
    pub target: Option<Cow<'static, str>>,
}

impl Entry {
    /// Create an entry without a target.
    pub fn new(level: Level, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            level,
            message: message.into(),
            target: None,
        }
    }

    /// Attach a target.
    pub fn with_target(mut self, target: impl Into<Cow<'static, str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// The sampling key of this entry.
    pub fn key(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "[{}] {}: {}", self.level, target, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}
