//! WatchClient trait for mocking
//!
//! This trait abstracts the list/watch calls to enable mocking in unit tests.
//! `KubeWatchClient` implements it against a cluster, and tests use
//! `MockWatchClient` behind the `test-util` feature.

use crate::error::WatchClientError;
use crate::models::{NotificationStream, ResourceSnapshot};
use resources::ResourceKind;

/// Trait for list/watch operations on a single resource kind
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait WatchClientTrait: Send + Sync {
    /// Kind of resource this client lists and watches
    fn kind(&self) -> ResourceKind;

    /// List all current resources and return the listing's resource version
    async fn list(&self) -> Result<ResourceSnapshot, WatchClientError>;

    /// Open a watch starting from `resource_version`
    async fn watch(&self, resource_version: &str) -> Result<NotificationStream, WatchClientError>;
}
