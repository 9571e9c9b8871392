//! Watch client models

use crate::error::WatchClientError;
use futures::stream::BoxStream;
use resources::ResourceObject;
use std::fmt;

/// Change type carried by a watch notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventType {
    /// Object was created
    Added,
    /// Object was modified
    Modified,
    /// Object was deleted
    Deleted,
}

impl fmt::Display for WatchEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEventType::Added => f.write_str("ADDED"),
            WatchEventType::Modified => f.write_str("MODIFIED"),
            WatchEventType::Deleted => f.write_str("DELETED"),
        }
    }
}

/// A single change observed on a watch stream.
#[derive(Debug, Clone)]
pub struct RawNotification {
    /// What happened to the object
    pub event_type: WatchEventType,
    /// The object as the server sent it
    pub object: ResourceObject,
}

impl RawNotification {
    /// Create a notification from anything convertible into a [`ResourceObject`]
    pub fn new(event_type: WatchEventType, object: impl Into<ResourceObject>) -> Self {
        Self {
            event_type,
            object: object.into(),
        }
    }
}

/// Result of a full listing.
#[derive(Debug, Clone, Default)]
pub struct ResourceSnapshot {
    /// Version marker from which a watch will not miss changes
    pub resource_version: String,
    /// Objects present at listing time
    pub items: Vec<ResourceObject>,
}

/// Stream of notifications from an open watch.
///
/// Ends when the server closes the connection; an `Err` item means the watch
/// is no longer trustworthy and must be re-established from a fresh listing.
pub type NotificationStream = BoxStream<'static, Result<RawNotification, WatchClientError>>;
