//! Watch client errors

use thiserror::Error;

/// Errors that can occur while listing or watching resources
#[derive(Debug, Error)]
pub enum WatchClientError {
    /// Kubernetes API or transport error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// The API server sent an error event on an open watch
    #[error("Watch error event: {0}")]
    WatchEvent(String),

    /// Error injected by a test double
    #[error("API error: {0}")]
    Api(String),
}
