//! Watch session manager.
//!
//! Runs the list/watch cycle for one resource kind:
//!
//! - **Listing**: list the kind to obtain a resource version.
//! - **Streaming**: watch from that version, normalize each notification and
//!   push the resulting event onto the channel.
//! - Any list failure, watch failure, stream error or stream end discards the
//!   session and starts over from a fresh listing.
//!
//! Because every reconnect starts from a fresh listing, a change can be seen
//! again after a reconnect; delivery is at-least-once and nothing here
//! deduplicates. Failed attempts are paced by [`ReconnectBackoff`]; a stream
//! that simply ends is relisted immediately. The backoff only resets once a
//! watch has delivered a notification or closed cleanly, so a cluster that
//! allows listing but keeps rejecting watches is retried at a growing interval.

use crate::backoff::ReconnectBackoff;
use crate::event::{Event, normalize};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use watch_client::WatchClientTrait;

/// How a single list/watch session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The stream ended normally; relist right away
    Closed,
    /// A call failed; relist after a backoff delay
    Failed,
    /// Shutdown was requested or the dispatcher is gone
    Stopped,
}

/// Resolves once shutdown is requested. A dropped sender counts as a request.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Producer side of the event channel.
pub struct Watcher {
    client: Arc<dyn WatchClientTrait>,
    events: mpsc::Sender<Event>,
    backoff: ReconnectBackoff,
    shutdown: watch::Receiver<bool>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("kind", &self.client.kind())
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        client: Arc<dyn WatchClientTrait>,
        events: mpsc::Sender<Event>,
        backoff: ReconnectBackoff,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            events,
            backoff,
            shutdown,
        }
    }

    /// Runs list/watch sessions until shutdown or until the dispatcher goes away.
    pub async fn run(mut self) {
        let kind = self.client.kind();
        info!(%kind, "Starting resource watcher");

        loop {
            match self.run_session().await {
                SessionEnd::Closed => {
                    self.backoff.reset();
                    info!(%kind, "Watch stream closed, restarting");
                }
                SessionEnd::Failed => {
                    let delay = self.backoff.next_delay();
                    info!(%kind, delay = ?delay, "Restarting watch after failure");
                    if !delay.is_zero() {
                        tokio::select! {
                            () = shutdown_requested(&mut self.shutdown) => break,
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                }
                SessionEnd::Stopped => break,
            }
        }

        info!(%kind, "Resource watcher stopped");
    }

    /// One Listing -> Streaming pass.
    async fn run_session(&mut self) -> SessionEnd {
        let kind = self.client.kind();
        if *self.shutdown.borrow() {
            return SessionEnd::Stopped;
        }

        let listed = tokio::select! {
            () = shutdown_requested(&mut self.shutdown) => return SessionEnd::Stopped,
            listed = self.client.list() => listed,
        };
        let snapshot = match listed {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%kind, error = %e, "Failed to list resources");
                return SessionEnd::Failed;
            }
        };
        debug!(
            %kind,
            resource_version = %snapshot.resource_version,
            items = snapshot.items.len(),
            "Listed resources"
        );

        let opened = tokio::select! {
            () = shutdown_requested(&mut self.shutdown) => return SessionEnd::Stopped,
            opened = self.client.watch(&snapshot.resource_version) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                warn!(%kind, error = %e, "Failed to open watch");
                return SessionEnd::Failed;
            }
        };
        info!(%kind, resource_version = %snapshot.resource_version, "Watching for changes");

        loop {
            let next = tokio::select! {
                () = shutdown_requested(&mut self.shutdown) => return SessionEnd::Stopped,
                next = stream.next() => next,
            };

            let notification = match next {
                None => return SessionEnd::Closed,
                Some(Err(e)) => {
                    warn!(%kind, error = %e, "Watch stream error");
                    return SessionEnd::Failed;
                }
                Some(Ok(notification)) => notification,
            };
            // The session is healthy once the stream delivers something.
            self.backoff.reset();

            let event_type = notification.event_type;
            let Some(event) = normalize(notification, kind) else {
                warn!(%kind, %event_type, "Dropping notification for object without a name");
                continue;
            };

            info!(
                %kind,
                identity_key = %event.identity_key,
                resource_name = %event.resource_name,
                action = %event.action,
                "Observed change"
            );
            debug!(payload = %event.payload, "Event payload");

            // Waits for capacity when the dispatcher is behind; events are never dropped here.
            if self.events.send(event).await.is_err() {
                error!(%kind, "Event channel closed, stopping watcher");
                return SessionEnd::Stopped;
            }
        }
    }
}
