//! Kubernetes watch client
//!
//! Implements [`WatchClientTrait`] on top of `kube::Api`. The wire protocol,
//! authentication and TLS are handled entirely by `kube`.

use crate::error::WatchClientError;
use crate::models::{NotificationStream, RawNotification, ResourceSnapshot, WatchEventType};
use crate::watch_trait::WatchClientTrait;
use futures::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    ConfigMap, Event, Namespace, Node, PersistentVolume, Pod, ReplicationController, Secret,
    Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::ClusterRole;
use kube::api::{ListParams, WatchEvent, WatchParams};
use kube::{Api, Client, Resource};
use resources::{ResourceKind, ResourceObject};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// List/watch client for one typed Kubernetes resource
pub struct KubeWatchClient<K> {
    api: Api<K>,
    kind: ResourceKind,
}

impl<K> KubeWatchClient<K> {
    /// Create a client over an existing `Api`
    ///
    /// # Arguments
    /// * `api` - Namespaced or cluster-wide API handle for `K`
    /// * `kind` - The kind `K` corresponds to, stamped on every event
    pub fn new(api: Api<K>, kind: ResourceKind) -> Self {
        Self { api, kind }
    }
}

impl<K> Debug for KubeWatchClient<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeWatchClient")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Namespaced API when a namespace is given, cluster-wide otherwise.
fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

impl KubeWatchClient<()> {
    /// Build the client for a runtime-selected kind.
    ///
    /// Namespaced kinds are watched in `namespace` (or across all namespaces
    /// when `None`); cluster-scoped kinds ignore `namespace`.
    pub fn for_kind(
        client: Client,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> Box<dyn WatchClientTrait> {
        match kind {
            ResourceKind::Deployment => {
                Box::new(KubeWatchClient::<Deployment>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::ReplicationController => Box::new(
                KubeWatchClient::<ReplicationController>::new(scoped_api(client, namespace), kind),
            ),
            ResourceKind::ReplicaSet => {
                Box::new(KubeWatchClient::<ReplicaSet>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::DaemonSet => {
                Box::new(KubeWatchClient::<DaemonSet>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::Service => {
                Box::new(KubeWatchClient::<Service>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::Pod => {
                Box::new(KubeWatchClient::<Pod>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::Job => {
                Box::new(KubeWatchClient::<Job>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::PersistentVolume => {
                Box::new(KubeWatchClient::<PersistentVolume>::new(Api::all(client), kind))
            }
            ResourceKind::Namespace => {
                Box::new(KubeWatchClient::<Namespace>::new(Api::all(client), kind))
            }
            ResourceKind::Secret => {
                Box::new(KubeWatchClient::<Secret>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::Ingress => {
                Box::new(KubeWatchClient::<Ingress>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::Node => Box::new(KubeWatchClient::<Node>::new(Api::all(client), kind)),
            ResourceKind::ClusterRole => {
                Box::new(KubeWatchClient::<ClusterRole>::new(Api::all(client), kind))
            }
            ResourceKind::ServiceAccount => Box::new(KubeWatchClient::<ServiceAccount>::new(
                scoped_api(client, namespace),
                kind,
            )),
            ResourceKind::Event => {
                Box::new(KubeWatchClient::<Event>::new(scoped_api(client, namespace), kind))
            }
            ResourceKind::ConfigMap => {
                Box::new(KubeWatchClient::<ConfigMap>::new(scoped_api(client, namespace), kind))
            }
        }
    }
}

/// Convert one raw watch event into a notification.
///
/// Bookmarks carry no object change and are skipped.
fn to_notification<K>(
    event: Result<WatchEvent<K>, kube::Error>,
) -> Option<Result<RawNotification, WatchClientError>>
where
    ResourceObject: From<K>,
{
    match event {
        Ok(WatchEvent::Added(object)) => {
            Some(Ok(RawNotification::new(WatchEventType::Added, object)))
        }
        Ok(WatchEvent::Modified(object)) => {
            Some(Ok(RawNotification::new(WatchEventType::Modified, object)))
        }
        Ok(WatchEvent::Deleted(object)) => {
            Some(Ok(RawNotification::new(WatchEventType::Deleted, object)))
        }
        Ok(WatchEvent::Bookmark(bookmark)) => {
            debug!(
                resource_version = %bookmark.metadata.resource_version,
                "Watch bookmark"
            );
            None
        }
        Ok(WatchEvent::Error(status)) => {
            Some(Err(WatchClientError::WatchEvent(format!("{status:?}"))))
        }
        Err(e) => Some(Err(WatchClientError::Kube(e))),
    }
}

#[async_trait::async_trait]
impl<K> WatchClientTrait for KubeWatchClient<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    ResourceObject: From<K>,
{
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn list(&self) -> Result<ResourceSnapshot, WatchClientError> {
        debug!(kind = %self.kind, "Listing resources");
        let list = self.api.list(&ListParams::default()).await?;

        Ok(ResourceSnapshot {
            resource_version: list.metadata.resource_version.unwrap_or_default(),
            items: list.items.into_iter().map(ResourceObject::from).collect(),
        })
    }

    async fn watch(&self, resource_version: &str) -> Result<NotificationStream, WatchClientError> {
        debug!(kind = %self.kind, resource_version, "Opening watch");
        let stream = self
            .api
            .watch(&WatchParams::default(), resource_version)
            .await?;

        Ok(stream
            .filter_map(|event| futures::future::ready(to_notification(event)))
            .boxed())
    }
}
