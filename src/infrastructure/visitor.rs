//! Extraction of the `message` field from tracing events.
//!
//! The sampler keys on message text only, so this visitor ignores every
//! other field. The `message` field of `info!("...")` style macros arrives
//! through `record_debug` as `format_args!`, whose `Debug` output is the
//! formatted text without quotes.

use std::fmt;
use tracing::field::{Field, Visit};

/// A visitor that keeps only the event's `message` field.
#[derive(Debug, Default)]
pub(crate) struct MessageVisitor {
    message: Option<String>,
}

impl MessageVisitor {
    /// Create an empty visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event` and return its message, if it has one.
    pub fn extract(event: &tracing::Event<'_>) -> Option<String> {
        let mut visitor = Self::new();
        event.record(&mut visitor);
        visitor.into_message()
    }

    /// Consume the visitor and return the message.
    pub fn into_message(self) -> Option<String> {
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Clone, Default)]
    struct Grab(Arc<Mutex<Vec<Option<String>>>>);

    impl<S: tracing::Subscriber> Layer<S> for Grab {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(MessageVisitor::extract(event));
        }
    }

    #[test]
    fn test_empty_visitor() {
        assert!(MessageVisitor::new().into_message().is_none());
    }

    #[test]
    fn test_extracts_formatted_message_only() {
        let grab = Grab::default();
        let subscriber = tracing_subscriber::registry().with(grab.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(user = "alice", "login from {}", "10.0.0.1");
            tracing::info!(user = "bob");
            tracing::info!(message = "explicit");
        });

        let seen = grab.0.lock().unwrap();
        assert_eq!(seen[0].as_deref(), Some("login from 10.0.0.1"));
        assert_eq!(seen[1], None);
        assert_eq!(seen[2].as_deref(), Some("explicit"));
    }
}
