//! Reaction handlers.
//!
//! A handler is bound to a [`Trigger`] and reacts to events that match it.
//! Handlers guard themselves: [`Handler::handle`] re-checks the trigger, so a
//! handler can be invoked with any event, inside or outside the registry.
//! Failures stop at this boundary; they are logged and never reach the
//! dispatcher.

mod command;
mod diagnostic;
mod registry;

pub use command::{CommandHandler, CommandRunner, ProcessRunner};
pub use diagnostic::DiagnosticHandler;
pub use registry::HandlerRegistry;

use crate::event::Event;
use std::fmt::Debug;
use thiserror::Error;
use tracing::warn;

/// Exact-match predicate on an event's action and resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Action name to match (`create`, `update` or `delete`)
    pub action: String,
    /// Resource name to match, as `namespace/name`
    pub resource_name: String,
}

impl Trigger {
    /// Build a trigger from an action name and a resource name.
    pub fn new(action: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource_name: resource_name.into(),
        }
    }

    /// Plain string equality on both fields; no wildcards or prefixes.
    pub fn matches(&self, event: &Event) -> bool {
        self.action == event.action.as_str() && self.resource_name == event.resource_name
    }
}

/// Errors raised while a handler reacts to an event.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The child process could not be started
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child process exited unsuccessfully
    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: String },

    /// The handler configuration cannot produce a working handler
    #[error("invalid handler options: {0}")]
    InvalidOptions(String),
}

/// A configured reaction to events.
#[async_trait::async_trait]
pub trait Handler: Send + Sync + Debug {
    /// Short handler type name used in logs
    fn name(&self) -> &'static str;

    /// Predicate an event must satisfy for this handler to react
    fn trigger(&self) -> &Trigger;

    /// Perform the reaction. Only called for matching events.
    async fn react(&self, event: &Event) -> Result<(), HandlerError>;

    /// React if the event matches the trigger, logging any failure.
    ///
    /// Returns whether the handler reacted.
    async fn handle(&self, event: &Event) -> bool {
        if !self.trigger().matches(event) {
            return false;
        }

        if let Err(e) = self.react(event).await {
            warn!(
                handler = self.name(),
                resource_name = %event.resource_name,
                action = %event.action,
                error = %e,
                "Handler failed"
            );
        }
        true
    }
}
