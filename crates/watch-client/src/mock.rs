//! Mock WatchClient for unit testing
//!
//! `MockWatchClient` replays a script of list/watch outcomes so the watch
//! session loop can be exercised without a cluster. Each step is consumed by
//! the call it describes; once the script is exhausted, listings succeed and
//! watches stay open without ever yielding.

use crate::error::WatchClientError;
use crate::models::{NotificationStream, RawNotification, ResourceSnapshot};
use crate::watch_trait::WatchClientTrait;
use futures::StreamExt;
use resources::ResourceKind;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// The next `list()` fails
    ListFailure(String),
    /// The next `watch()` fails to open
    WatchFailure(String),
    /// The next `watch()` yields these notifications, then closes
    Stream(Vec<RawNotification>),
    /// The next `watch()` yields these notifications, then an error
    StreamError(Vec<RawNotification>, String),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockStep>,
    list_calls: usize,
    watched_versions: Vec<String>,
}

/// Mock list/watch client for testing
#[derive(Debug, Clone)]
pub struct MockWatchClient {
    kind: ResourceKind,
    state: Arc<Mutex<MockState>>,
}

impl MockWatchClient {
    /// Create a new mock client with an empty script
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Append a step to the script (for test setup)
    #[must_use]
    pub fn then(self, step: MockStep) -> Self {
        self.state.lock().unwrap().script.push_back(step);
        self
    }

    /// Append a watch that delivers `notifications` and then closes
    #[must_use]
    pub fn then_stream(self, notifications: Vec<RawNotification>) -> Self {
        self.then(MockStep::Stream(notifications))
    }

    /// Number of `list()` calls made so far
    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    /// Resource versions passed to `watch()`, in call order
    pub fn watched_versions(&self) -> Vec<String> {
        self.state.lock().unwrap().watched_versions.clone()
    }
}

#[async_trait::async_trait]
impl WatchClientTrait for MockWatchClient {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn list(&self) -> Result<ResourceSnapshot, WatchClientError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        if let Some(MockStep::ListFailure(message)) = state.script.front() {
            let message = message.clone();
            state.script.pop_front();
            return Err(WatchClientError::Api(message));
        }

        Ok(ResourceSnapshot {
            resource_version: state.list_calls.to_string(),
            items: Vec::new(),
        })
    }

    async fn watch(&self, resource_version: &str) -> Result<NotificationStream, WatchClientError> {
        let mut state = self.state.lock().unwrap();
        state.watched_versions.push(resource_version.to_string());

        match state.script.pop_front() {
            Some(MockStep::WatchFailure(message)) => Err(WatchClientError::Api(message)),
            Some(MockStep::Stream(notifications)) => {
                Ok(futures::stream::iter(notifications.into_iter().map(Ok)).boxed())
            }
            Some(MockStep::StreamError(notifications, message)) => {
                let items = notifications
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(WatchClientError::Api(message))));
                Ok(futures::stream::iter(items).boxed())
            }
            // A list failure is only consumed by list(); leave it for the next attempt.
            Some(step @ MockStep::ListFailure(_)) => {
                state.script.push_front(step);
                Ok(futures::stream::empty().boxed())
            }
            None => Ok(futures::stream::pending().boxed()),
        }
    }
}
