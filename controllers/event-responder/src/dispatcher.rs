//! Event dispatch worker.
//!
//! Drains the event channel in FIFO order and runs every matching handler
//! for each event, one at a time, in registration order. A handler that
//! never returns stalls dispatch; no timeout is imposed.

use crate::event::Event;
use crate::handlers::HandlerRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Single consumer of the event channel.
#[derive(Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher that owns `registry`.
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Runs until the channel is closed and drained.
    pub async fn run(self, mut events: mpsc::Receiver<Event>) {
        info!(handlers = self.registry.len(), "Starting event dispatcher");

        while let Some(event) = events.recv().await {
            self.dispatch(&event).await;
        }

        info!("Event channel closed, dispatcher stopped");
    }

    /// Runs the handlers matching `event` sequentially and returns how many ran.
    pub async fn dispatch(&self, event: &Event) -> usize {
        info!(
            identity_key = %event.identity_key,
            resource_name = %event.resource_name,
            action = %event.action,
            "Event received"
        );

        let mut fired = 0;
        for handler in self.registry.matching(event) {
            if handler.handle(event).await {
                fired += 1;
            }
        }

        debug!(resource_name = %event.resource_name, fired, "Event dispatched");
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventAction;
    use crate::handlers::Handler;
    use crate::test_utils::{RecordingHandler, event};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn recording(label: &'static str, name: &str, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn Handler> {
        Box::new(RecordingHandler::new(label, "update", name, Arc::clone(log)))
    }

    #[tokio::test]
    async fn test_handlers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::from_handlers(vec![
            recording("H1", "default/x", &log),
            recording("H2", "default/x", &log),
            recording("H3", "default/x", &log),
        ]);
        let dispatcher = Dispatcher::new(registry);

        let fired = dispatcher.dispatch(&event(EventAction::Update, "default/x")).await;

        assert_eq!(fired, 3);
        assert_eq!(*log.lock().unwrap(), vec!["H1 default/x", "H2 default/x", "H3 default/x"]);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::from_handlers(vec![
            Box::new(RecordingHandler::new("H1", "update", "default/x", Arc::clone(&log)).failing())
                as Box<dyn Handler>,
            recording("H2", "default/x", &log),
        ]);
        let dispatcher = Dispatcher::new(registry);

        assert_eq!(dispatcher.dispatch(&event(EventAction::Update, "default/x")).await, 2);
        assert_eq!(*log.lock().unwrap(), vec!["H1 default/x", "H2 default/x"]);
    }

    #[tokio::test]
    async fn test_only_matching_handlers_run() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::from_handlers(vec![
            recording("H1", "default/x", &log),
            recording("H2", "default/y", &log),
        ]);
        let dispatcher = Dispatcher::new(registry);

        assert_eq!(dispatcher.dispatch(&event(EventAction::Update, "default/y")).await, 1);
        assert_eq!(dispatcher.dispatch(&event(EventAction::Delete, "default/y")).await, 0);
        assert_eq!(*log.lock().unwrap(), vec!["H2 default/y"]);
    }

    #[tokio::test]
    async fn test_run_drains_in_fifo_order_until_closed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::from_handlers(vec![
            recording("H", "default/a", &log),
            recording("H", "default/b", &log),
            recording("H", "default/c", &log),
        ]);
        let (tx, rx) = mpsc::channel(4);

        for name in ["default/a", "default/b", "default/c"] {
            tx.send(event(EventAction::Update, name)).await.unwrap();
        }
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), Dispatcher::new(registry).run(rx))
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["H default/a", "H default/b", "H default/c"]);
    }
}
