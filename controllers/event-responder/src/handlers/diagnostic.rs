//! Diagnostic reaction: logs a configured message with the triggering event.

use super::{Handler, HandlerError, Trigger};
use crate::event::Event;
use tracing::info;

/// Emits its message and the event to the operator log.
#[derive(Debug, Clone)]
pub struct DiagnosticHandler {
    trigger: Trigger,
    message: String,
}

impl DiagnosticHandler {
    /// Log `message` whenever `trigger` matches.
    pub fn new(trigger: Trigger, message: impl Into<String>) -> Self {
        Self {
            trigger,
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
impl Handler for DiagnosticHandler {
    fn name(&self) -> &'static str {
        "diagnostic"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn react(&self, event: &Event) -> Result<(), HandlerError> {
        info!(
            diagnostic = %self.message,
            identity_key = %event.identity_key,
            resource_name = %event.resource_name,
            action = %event.action,
            resource_type = %event.resource_type,
            payload = %event.payload,
            "Diagnostic handler fired"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventAction;
    use crate::test_utils::{LogCapture, event};

    #[tokio::test]
    async fn test_logs_message_and_event_on_match() {
        let capture = LogCapture::default();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let handler = DiagnosticHandler::new(Trigger::new("delete", "default/x"), "hello world");

        assert!(handler.handle(&event(EventAction::Delete, "default/x")).await);

        let output = capture.contents();
        assert!(output.contains("Diagnostic handler fired"), "{output}");
        assert!(output.contains("diagnostic=hello world"), "{output}");
        assert!(output.contains("resource_name=default/x"), "{output}");
        assert!(output.contains("action=delete"), "{output}");
        assert!(output.contains("resource_type=configmap"), "{output}");
    }

    #[tokio::test]
    async fn test_silent_when_trigger_does_not_match() {
        let capture = LogCapture::default();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let handler = DiagnosticHandler::new(Trigger::new("delete", "default/x"), "hello world");

        assert!(!handler.handle(&event(EventAction::Update, "default/x")).await);
        assert!(!handler.handle(&event(EventAction::Delete, "default/y")).await);

        assert_eq!(capture.contents(), "");
    }
}
