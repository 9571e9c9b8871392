//! Watchable Resource Definitions
//!
//! The closed set of Kubernetes resource kinds the event responder can watch,
//! a tagged union over their typed objects, and metadata extraction.

pub mod kind;
pub mod object;

pub use kind::UnknownResourceKind;
pub use object::{ResourceKind, ResourceObject};

/// Re-exported so callers can name metadata without depending on k8s-openapi.
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
