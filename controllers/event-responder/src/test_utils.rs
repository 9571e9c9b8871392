//! Test utilities for unit testing the watcher, handlers and dispatcher
//!
//! This module provides helpers for creating test data and recording test doubles.

use crate::event::{Event, EventAction};
use crate::handlers::{CommandRunner, Handler, HandlerError, Trigger};
use chrono::Utc;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use resources::ResourceKind;
use std::sync::{Arc, Mutex};
use watch_client::{RawNotification, WatchEventType};

/// Helper to create object metadata with a UID
pub fn object_meta(name: &str, namespace: Option<&str>, uid: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        uid: Some(uid.to_string()),
        ..Default::default()
    }
}

/// Helper to create a test ConfigMap
pub fn config_map(namespace: &str, name: &str) -> ConfigMap {
    ConfigMap {
        metadata: object_meta(name, Some(namespace), &format!("uid-{namespace}-{name}")),
        ..Default::default()
    }
}

/// Helper to create a MODIFIED notification for a ConfigMap
pub fn update_notification(namespace: &str, name: &str) -> RawNotification {
    RawNotification::new(WatchEventType::Modified, config_map(namespace, name))
}

/// Helper to create an already-normalized event
pub fn event(action: EventAction, resource_name: &str) -> Event {
    Event {
        identity_key: format!("uid-{resource_name}"),
        resource_name: resource_name.to_string(),
        action,
        resource_type: ResourceKind::ConfigMap,
        payload: serde_json::Value::Null,
        observed_at: Utc::now(),
    }
}

/// Command runner that records invocations instead of spawning processes
#[derive(Debug)]
pub struct RecordingRunner {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    exit_code: Option<i32>,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            exit_code: Some(0),
        }
    }
}

impl RecordingRunner {
    /// A runner whose commands all exit with `exit_code`
    pub fn failing_with(exit_code: Option<i32>) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    /// Recorded `(program, args)` pairs, in call order
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<Option<i32>> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(self.exit_code)
    }
}

/// Handler that appends `"<label> <resource name>"` to a shared log
#[derive(Debug)]
pub struct RecordingHandler {
    label: &'static str,
    trigger: Trigger,
    log: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingHandler {
    pub fn new(
        label: &'static str,
        action: &str,
        resource_name: &str,
        log: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            label,
            trigger: Trigger::new(action, resource_name),
            log,
            fail: false,
        }
    }

    /// Record the call, then report a failure
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait::async_trait]
impl Handler for RecordingHandler {
    fn name(&self) -> &'static str {
        self.label
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn react(&self, event: &Event) -> Result<(), HandlerError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{} {}", self.label, event.resource_name));
        if self.fail {
            return Err(HandlerError::InvalidOptions("recording handler told to fail".to_string()));
        }
        Ok(())
    }
}

/// In-memory log sink for asserting on formatted `tracing` output
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Subscriber that formats INFO and above into this capture, without colors
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
