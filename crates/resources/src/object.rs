//! Resource object tagged union
//!
//! Kubernetes object types share no common supertype we can dispatch on at
//! runtime, so every supported kind is listed once in the `resource_objects!`
//! table below. The table generates [`ResourceKind`], [`ResourceObject`], the
//! `From` conversions and the metadata match, so adding a kind is a single line
//! and any exhaustive `match` on [`ResourceKind`] elsewhere stops compiling
//! until it handles the new kind.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    ConfigMap, Event, Namespace, Node, PersistentVolume, Pod, ReplicationController, Secret,
    Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::ClusterRole;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Metadata handed out for objects outside the supported set.
static EMPTY_METADATA: LazyLock<ObjectMeta> = LazyLock::new(ObjectMeta::default);

macro_rules! resource_objects {
    ($( $variant:ident => $ty:ty, $name:literal, namespaced = $namespaced:literal; )+) => {
        /// Logical kind of a watched resource.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ResourceKind {
            $(
                #[doc = concat!("`", $name, "` objects")]
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl ResourceKind {
            /// Every supported kind, in table order.
            pub const ALL: &'static [ResourceKind] = &[$(ResourceKind::$variant,)+];

            /// Lowercase singular name used in configuration and on events.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ResourceKind::$variant => $name,)+
                }
            }

            /// Whether objects of this kind live inside a namespace.
            #[must_use]
            pub fn is_namespaced(self) -> bool {
                match self {
                    $(ResourceKind::$variant => $namespaced,)+
                }
            }
        }

        /// A resource object of one of the supported kinds.
        ///
        /// Serializes as the bare Kubernetes object (no enum tag) so it can be
        /// used directly as an event payload.
        #[derive(Debug, Clone, Serialize)]
        #[serde(untagged)]
        #[allow(clippy::large_enum_variant, reason = "objects are moved once from the stream into an event")]
        pub enum ResourceObject {
            $(
                #[doc = concat!("A `", $name, "` object")]
                $variant($ty),
            )+
            /// An object of a kind outside the supported set, kept as raw JSON.
            Unsupported(serde_json::Value),
        }

        impl ResourceObject {
            /// Kind of this object, or `None` for unsupported objects.
            #[must_use]
            pub fn kind(&self) -> Option<ResourceKind> {
                match self {
                    $(ResourceObject::$variant(_) => Some(ResourceKind::$variant),)+
                    ResourceObject::Unsupported(_) => None,
                }
            }

            /// Returns the object's metadata.
            ///
            /// Unsupported objects yield an empty record rather than an error;
            /// callers treat an empty name as unrepresentable.
            #[must_use]
            pub fn metadata(&self) -> &ObjectMeta {
                match self {
                    $(ResourceObject::$variant(object) => &object.metadata,)+
                    ResourceObject::Unsupported(_) => &EMPTY_METADATA,
                }
            }
        }

        $(
            impl From<$ty> for ResourceObject {
                fn from(object: $ty) -> Self {
                    ResourceObject::$variant(object)
                }
            }
        )+
    };
}

resource_objects! {
    Deployment => Deployment, "deployment", namespaced = true;
    ReplicationController => ReplicationController, "replicationcontroller", namespaced = true;
    ReplicaSet => ReplicaSet, "replicaset", namespaced = true;
    DaemonSet => DaemonSet, "daemonset", namespaced = true;
    Service => Service, "service", namespaced = true;
    Pod => Pod, "pod", namespaced = true;
    Job => Job, "job", namespaced = true;
    PersistentVolume => PersistentVolume, "persistentvolume", namespaced = false;
    Namespace => Namespace, "namespace", namespaced = false;
    Secret => Secret, "secret", namespaced = true;
    Ingress => Ingress, "ingress", namespaced = true;
    Node => Node, "node", namespaced = false;
    ClusterRole => ClusterRole, "clusterrole", namespaced = false;
    ServiceAccount => ServiceAccount, "serviceaccount", namespaced = true;
    Event => Event, "event", namespaced = true;
    ConfigMap => ConfigMap, "configmap", namespaced = true;
}
