//! Responder configuration.
//!
//! Loaded once at startup from a YAML document. Loading never fails the
//! process: an unreadable or malformed document yields the defaults. Each
//! top-level setting and each handler entry is decoded on its own, so one bad
//! value does not discard the rest.

use resources::ResourceKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Default location of the configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kube-event-responder/config.yaml";

/// Errors raised while reading the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or has the wrong shape
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One configured reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConfig {
    /// Selects the handler implementation (`command` or `diagnostic`)
    pub handler_type: String,
    /// Event action that fires the handler (`create`, `update` or `delete`)
    pub trigger_action: String,
    /// Exact `namespace/name` that fires the handler
    pub trigger_resource_name: String,
    /// Handler-specific parameter: a command line or a message
    #[serde(default)]
    pub options: String,
}

/// Delay bounds between failed list/watch attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectConfig {
    pub min_millis: u64,
    pub max_millis: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            min_millis: 500,
            max_millis: 30_000,
        }
    }
}

/// Decode the top-level `key`, keeping `default` when it is absent or invalid.
fn setting<T: DeserializeOwned>(document: &serde_yaml::Value, key: &str, default: T) -> T {
    let Some(value) = document.get(key) else {
        return default;
    };
    match serde_yaml::from_value(value.clone()) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(key, error = %e, "Invalid setting, using default");
            default
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderConfig {
    /// Kind of resource to watch
    pub resource: ResourceKind,
    /// Namespace to watch; `None` watches all namespaces
    pub namespace: Option<String>,
    /// Capacity of the event channel between watcher and dispatcher
    pub channel_capacity: usize,
    pub reconnect: ReconnectConfig,
    /// Accept invalid API server certificates (out-of-cluster debugging only)
    pub insecure_skip_tls_verify: bool,
    pub handlers: Vec<HandlerConfig>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            resource: ResourceKind::ConfigMap,
            namespace: Some("default".to_string()),
            channel_capacity: 64,
            reconnect: ReconnectConfig::default(),
            insecure_skip_tls_verify: false,
            handlers: Vec::new(),
        }
    }
}

impl ResponderConfig {
    /// Load the configuration from `path`, falling back to defaults on any error.
    pub fn load(path: &Path) -> Self {
        let document = match std::fs::read_to_string(path) {
            Ok(document) => document,
            Err(source) => {
                let e = ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                };
                warn!(error = %e, "Configuration unavailable, continuing with defaults and no handlers");
                return Self::default();
            }
        };

        match Self::parse(&document) {
            Ok(config) => {
                info!(path = %path.display(), handlers = config.handlers.len(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(error = %e, "Configuration malformed, continuing with defaults and no handlers");
                Self::default()
            }
        }
    }

    /// Parse a YAML document.
    ///
    /// Only a document that is not YAML at all is an error. Malformed settings
    /// fall back to their defaults and malformed handler entries are skipped.
    pub fn parse(document: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(document)?;
        if value.is_null() {
            return Ok(Self::default());
        }

        if !value.is_mapping() {
            warn!("Configuration is not a mapping, using defaults");
            return Ok(Self::default());
        }

        let mut handlers = Vec::new();
        match value.get("handlers") {
            Some(serde_yaml::Value::Sequence(entries)) => {
                for (index, entry) in entries.iter().enumerate() {
                    match serde_yaml::from_value::<HandlerConfig>(entry.clone()) {
                        Ok(handler) => handlers.push(handler),
                        Err(e) => warn!(index, error = %e, "Skipping malformed handler entry"),
                    }
                }
            }
            Some(serde_yaml::Value::Null) | None => {}
            Some(_) => warn!("`handlers` is not a list, no handlers loaded"),
        }

        let defaults = Self::default();
        Ok(Self {
            resource: setting(&value, "resource", defaults.resource),
            namespace: setting(&value, "namespace", defaults.namespace),
            channel_capacity: setting(&value, "channelCapacity", defaults.channel_capacity).max(1),
            reconnect: setting(&value, "reconnect", defaults.reconnect),
            insecure_skip_tls_verify: setting(
                &value,
                "insecureSkipTlsVerify",
                defaults.insecure_skip_tls_verify,
            ),
            handlers,
        })
    }

    /// Apply environment overrides (`WATCH_NAMESPACE`, `WATCH_RESOURCE`).
    ///
    /// An empty `WATCH_NAMESPACE` watches all namespaces.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(namespace) = lookup("WATCH_NAMESPACE") {
            self.namespace = if namespace.is_empty() { None } else { Some(namespace) };
        }

        if let Some(resource) = lookup("WATCH_RESOURCE") {
            match resource.parse::<ResourceKind>() {
                Ok(kind) => self.resource = kind,
                Err(e) => warn!(error = %e, "Ignoring WATCH_RESOURCE"),
            }
        }

        self
    }
}
