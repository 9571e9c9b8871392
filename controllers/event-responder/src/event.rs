//! Canonical events and notification normalization.
//!
//! A watch notification becomes an [`Event`] only when its object carries a
//! name; anything else is reported as unrepresentable and dropped by the
//! caller.

use chrono::{DateTime, Utc};
use resources::{ObjectMeta, ResourceKind};
use serde::Serialize;
use std::fmt;
use tracing::warn;
use watch_client::{RawNotification, WatchEventType};

/// Lifecycle change carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    /// Object was created
    Create,
    /// Object was updated
    Update,
    /// Object was deleted
    Delete,
}

impl EventAction {
    /// Name used in handler triggers.
    pub fn as_str(self) -> &'static str {
        match self {
            EventAction::Create => "create",
            EventAction::Update => "update",
            EventAction::Delete => "delete",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WatchEventType> for EventAction {
    fn from(event_type: WatchEventType) -> Self {
        match event_type {
            WatchEventType::Added => EventAction::Create,
            WatchEventType::Modified => EventAction::Update,
            WatchEventType::Deleted => EventAction::Delete,
        }
    }
}

/// One observed change to a watched resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Server-assigned UID, or the resource name when the object has none
    pub identity_key: String,
    /// `namespace/name`, or `name` for cluster-scoped objects
    pub resource_name: String,
    /// What happened to the object
    pub action: EventAction,
    /// Kind of the watched resource
    pub resource_type: ResourceKind,
    /// The full object as JSON
    pub payload: serde_json::Value,
    /// When the watcher received the notification
    pub observed_at: DateTime<Utc>,
}

/// Namespace-qualified name of an object, `None` when it has no name.
pub fn namespaced_name(metadata: &ObjectMeta) -> Option<String> {
    let name = metadata.name.as_deref().filter(|name| !name.is_empty())?;
    match metadata.namespace.as_deref() {
        Some(namespace) if !namespace.is_empty() => Some(format!("{namespace}/{name}")),
        _ => Some(name.to_string()),
    }
}

/// Convert a raw notification into an [`Event`].
///
/// Returns `None` when the object is unrepresentable (unsupported kind or
/// missing name).
pub fn normalize(notification: RawNotification, resource_type: ResourceKind) -> Option<Event> {
    let metadata = notification.object.metadata();
    let resource_name = namespaced_name(metadata)?;
    let identity_key = metadata
        .uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .unwrap_or_else(|| resource_name.clone());

    let payload = match serde_json::to_value(&notification.object) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(resource_name = %resource_name, error = %e, "Failed to serialize event payload");
            serde_json::Value::Null
        }
    };

    Some(Event {
        identity_key,
        resource_name,
        action: notification.event_type.into(),
        resource_type,
        payload,
        observed_at: Utc::now(),
    })
}
