//! Kubernetes List/Watch Client
//!
//! A small client abstraction over the two calls the event responder needs
//! from the control plane: a full listing that yields a resource version, and
//! a watch stream opened from that version.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use resources::ResourceKind;
//! use watch_client::{KubeWatchClient, WatchClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let watch = KubeWatchClient::for_kind(client, ResourceKind::ConfigMap, Some("default"));
//!
//! let snapshot = watch.list().await?;
//! let mut stream = watch.watch(&snapshot.resource_version).await?;
//! while let Some(notification) = stream.next().await {
//!     println!("{:?}", notification?.event_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod watch_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeWatchClient;
pub use error::WatchClientError;
pub use models::*;
pub use watch_trait::WatchClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockStep, MockWatchClient};
