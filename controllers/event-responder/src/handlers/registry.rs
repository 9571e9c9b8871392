//! Handler registry.
//!
//! Built once from configuration and read-only afterwards. Handlers keep
//! their configuration order, which is also the order they run in.

use super::{CommandHandler, CommandRunner, DiagnosticHandler, Handler, HandlerError, Trigger};
use crate::config::HandlerConfig;
use crate::event::Event;
use std::sync::Arc;
use tracing::{info, warn};

/// Ordered set of configured handlers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Wrap already-built handlers, keeping their order.
    pub fn from_handlers(handlers: Vec<Box<dyn Handler>>) -> Self {
        Self { handlers }
    }

    /// Build handlers from configuration entries.
    ///
    /// Entries with an unknown `handler_type`, or whose options cannot produce
    /// a handler, are dropped with a warning.
    pub fn from_configs(configs: &[HandlerConfig], runner: &Arc<dyn CommandRunner>) -> Self {
        let mut handlers: Vec<Box<dyn Handler>> = Vec::with_capacity(configs.len());

        for (index, config) in configs.iter().enumerate() {
            match build_handler(config, runner) {
                Ok(Some(handler)) => handlers.push(handler),
                Ok(None) => warn!(
                    index,
                    handler_type = %config.handler_type,
                    "Skipping handler with unknown type"
                ),
                Err(e) => warn!(
                    index,
                    handler_type = %config.handler_type,
                    error = %e,
                    "Skipping handler"
                ),
            }
        }

        info!(configured = configs.len(), registered = handlers.len(), "Handler registry built");
        Self::from_handlers(handlers)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler was registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers whose trigger matches `event`, in registration order.
    pub fn matching<'a>(&'a self, event: &'a Event) -> impl Iterator<Item = &'a dyn Handler> + 'a {
        self.handlers
            .iter()
            .map(|handler| -> &'a dyn Handler { handler.as_ref() })
            .filter(move |handler| handler.trigger().matches(event))
    }
}

fn build_handler(
    config: &HandlerConfig,
    runner: &Arc<dyn CommandRunner>,
) -> Result<Option<Box<dyn Handler>>, HandlerError> {
    let trigger = Trigger::new(&config.trigger_action, &config.trigger_resource_name);

    let handler: Box<dyn Handler> = match config.handler_type.as_str() {
        "command" => Box::new(CommandHandler::new(trigger, &config.options, Arc::clone(runner))?),
        "diagnostic" => Box::new(DiagnosticHandler::new(trigger, config.options.clone())),
        _ => return Ok(None),
    };
    Ok(Some(handler))
}
