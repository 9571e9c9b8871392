//! Kube Event Responder
//!
//! Watches one Kubernetes resource kind (ConfigMaps by default) and runs
//! configured reactions when a matching resource is created, updated or
//! deleted:
//! - command: runs a command line as a child process
//! - diagnostic: logs a message together with the event
//!
//! The watch is re-established from a fresh listing whenever it drops.

mod backoff;
mod config;
mod controller;
mod dispatcher;
mod error;
mod event;
mod handlers;
mod watcher;
#[cfg(test)]
mod test_utils;

use crate::config::{DEFAULT_CONFIG_PATH, ResponderConfig};
use crate::error::ControllerError;
use controller::Controller;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube is built with rustls; pick the ring provider before any TLS happens
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    info!("Starting Kube Event Responder");

    // Load configuration from file, then environment overrides
    let config_path = env::var("RESPONDER_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = ResponderConfig::load(&config_path).with_env(|key| env::var(key).ok());

    info!("Configuration:");
    info!("  Config file: {}", config_path.display());
    info!("  Resource: {}", config.resource);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Handlers: {}", config.handlers.len());

    // Initialize and run controller
    let controller = Controller::new(&config).await?;
    controller.run(shutdown_signal()).await?;

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
