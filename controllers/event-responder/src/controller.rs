//! Main controller implementation.
//!
//! This module contains the `Controller` struct that builds the handler
//! registry and the watch client, then runs the watcher (producer) and the
//! dispatcher (consumer) as two tasks joined by a bounded channel.
//!
//! Shutdown is an explicit signal: the watcher stops, drops its end of the
//! channel, and the dispatcher finishes the events already queued.

use crate::backoff::ReconnectBackoff;
use crate::config::ResponderConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ControllerError;
use crate::handlers::{CommandRunner, HandlerRegistry, ProcessRunner};
use crate::watcher::Watcher;
use kube::Client;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};
use watch_client::{KubeWatchClient, WatchClientTrait};

/// Running watcher and dispatcher tasks.
#[derive(Debug)]
pub struct Controller {
    watcher: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Map a task's join failure onto the error variant `wrap` builds.
fn joined(
    result: Result<(), JoinError>,
    wrap: fn(String) -> ControllerError,
) -> Result<(), ControllerError> {
    result.map_err(|e| wrap(format!("task panicked: {e}")))
}

impl Controller {
    /// Creates the Kubernetes client, registry and tasks from configuration.
    pub async fn new(config: &ResponderConfig) -> Result<Self, ControllerError> {
        info!("Initializing event responder");

        // Create Kubernetes client (in-cluster service account or kubeconfig)
        let mut kube_config = kube::Config::infer()
            .await
            .map_err(|e| ControllerError::InvalidConfig(format!("Kubernetes client config: {e}")))?;
        if config.insecure_skip_tls_verify {
            warn!("TLS verification of the API server is disabled");
            kube_config.accept_invalid_certs = true;
        }
        let kube_client = Client::try_from(kube_config)?;

        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
        let registry = HandlerRegistry::from_configs(&config.handlers, &runner);
        if registry.is_empty() {
            warn!("No handlers registered; events will only be logged");
        }

        let client: Arc<dyn WatchClientTrait> = Arc::from(KubeWatchClient::for_kind(
            kube_client,
            config.resource,
            config.namespace.as_deref(),
        ));

        Ok(Self::start(client, registry, config))
    }

    /// Spawns the watcher and dispatcher tasks.
    pub fn start(
        client: Arc<dyn WatchClientTrait>,
        registry: HandlerRegistry,
        config: &ResponderConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let watcher = Watcher::new(
            client,
            events_tx,
            ReconnectBackoff::new(config.reconnect.min_millis, config.reconnect.max_millis),
            shutdown_rx,
        );
        let dispatcher = Dispatcher::new(registry);

        Self {
            watcher: tokio::spawn(watcher.run()),
            dispatcher: tokio::spawn(dispatcher.run(events_rx)),
            shutdown,
        }
    }

    /// Runs until `signal` resolves or a task exits, then shuts down cleanly.
    pub async fn run<S>(self, signal: S) -> Result<(), ControllerError>
    where
        S: Future<Output = ()>,
    {
        info!("Event responder running");
        let Self {
            mut watcher,
            mut dispatcher,
            shutdown,
        } = self;

        tokio::select! {
            () = signal => {
                info!("Shutdown requested");
            }
            result = &mut watcher => {
                // Dropping the watcher closed the channel; let the dispatcher drain it.
                warn!("Watcher exited");
                joined(result, ControllerError::Watch)?;
                return joined(dispatcher.await, ControllerError::Dispatch);
            }
            result = &mut dispatcher => {
                warn!("Dispatcher exited");
                shutdown.send_replace(true);
                joined(result, ControllerError::Dispatch)?;
                return joined(watcher.await, ControllerError::Watch);
            }
        }

        shutdown.send_replace(true);
        joined(watcher.await, ControllerError::Watch)?;
        joined(dispatcher.await, ControllerError::Dispatch)?;
        info!("Event responder stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerConfig;
    use crate::test_utils::{RecordingRunner, update_notification};
    use resources::ResourceKind;
    use std::time::Duration;
    use watch_client::MockWatchClient;

    fn test_config() -> ResponderConfig {
        ResponderConfig {
            reconnect: crate::config::ReconnectConfig {
                min_millis: 0,
                max_millis: 0,
            },
            handlers: vec![HandlerConfig {
                handler_type: "command".to_string(),
                trigger_action: "update".to_string(),
                trigger_resource_name: "default/streaming-couchdb-configmap".to_string(),
                options: "echo hi".to_string(),
            }],
            ..ResponderConfig::default()
        }
    }

    /// Resolves once the mock has been relisted `count` times.
    async fn listed(mock: MockWatchClient, count: usize) {
        while mock.list_calls() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_matching_update_runs_command_once() {
        let config = test_config();
        let runner = Arc::new(RecordingRunner::default());
        let registry =
            HandlerRegistry::from_configs(&config.handlers, &(Arc::clone(&runner) as Arc<dyn CommandRunner>));
        let mock = MockWatchClient::new(ResourceKind::ConfigMap).then_stream(vec![
            update_notification("default", "streaming-couchdb-configmap"),
            update_notification("default", "other-configmap"),
        ]);

        let controller = Controller::start(Arc::new(mock.clone()), registry, &config);
        // The second listing happens only after both notifications are queued.
        tokio::time::timeout(Duration::from_secs(5), controller.run(listed(mock, 2)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(runner.calls(), vec![("echo".to_string(), vec!["hi".to_string()])]);
    }

    #[tokio::test]
    async fn test_other_resource_runs_nothing() {
        let config = test_config();
        let runner = Arc::new(RecordingRunner::default());
        let registry =
            HandlerRegistry::from_configs(&config.handlers, &(Arc::clone(&runner) as Arc<dyn CommandRunner>));
        let mock = MockWatchClient::new(ResourceKind::ConfigMap)
            .then_stream(vec![update_notification("default", "other-configmap")]);

        let controller = Controller::start(Arc::new(mock.clone()), registry, &config);
        tokio::time::timeout(Duration::from_secs(5), controller.run(listed(mock, 2)))
            .await
            .unwrap()
            .unwrap();

        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_with_no_handlers() {
        let config = ResponderConfig::default();
        let mock = MockWatchClient::new(ResourceKind::ConfigMap);

        let controller = Controller::start(Arc::new(mock), HandlerRegistry::default(), &config);
        tokio::time::timeout(Duration::from_secs(5), controller.run(async {}))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_task_panic_maps_to_task_error() {
        let panicked: Result<(), JoinError> = tokio::spawn(async { panic!("boom") }).await;

        let error = joined(panicked, ControllerError::Dispatch).unwrap_err();
        assert!(matches!(&error, ControllerError::Dispatch(message) if message.contains("panicked")));

        assert!(joined(Ok(()), ControllerError::Watch).is_ok());
    }
}
