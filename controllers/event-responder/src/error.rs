//! Controller-specific error types.
//!
//! Only startup and task supervision can fail the process. Everything inside
//! the watch and dispatch loops is logged and recovered locally.

use thiserror::Error;
use kube::Error as KubeError;

/// Errors that can occur in the event responder.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client construction error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch task failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Dispatch task failed
    #[error("Event dispatch failed: {0}")]
    Dispatch(String),
}
