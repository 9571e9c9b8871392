//! Command-execution reaction.

use super::{Handler, HandlerError, Trigger};
use crate::event::Event;
use std::fmt::Debug;
use std::process::Stdio;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs a program to completion.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync + Debug {
    /// Run `program` with `args` and wait for it.
    ///
    /// Returns the exit code, or `None` when the process was killed by a signal.
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<Option<i32>>;
}

/// Spawns real child processes that share this process's stdout, stderr and
/// working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<Option<i32>> {
        let status = tokio::process::Command::new(program)
            .args(args)
            .current_dir(".")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        Ok(status.code())
    }
}

/// Executes a configured command line when its trigger matches.
///
/// The exit status is only logged; nothing downstream depends on it.
#[derive(Debug)]
pub struct CommandHandler {
    trigger: Trigger,
    program: String,
    args: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl CommandHandler {
    /// Build a handler from a whitespace-separated command line.
    pub fn new(
        trigger: Trigger,
        command_line: &str,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, HandlerError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| HandlerError::InvalidOptions("empty command line".to_string()))?;

        Ok(Self {
            trigger,
            program,
            args: parts.collect(),
            runner,
        })
    }
}

#[async_trait::async_trait]
impl Handler for CommandHandler {
    fn name(&self) -> &'static str {
        "command"
    }

    fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    async fn react(&self, event: &Event) -> Result<(), HandlerError> {
        info!(
            program = %self.program,
            args = ?self.args,
            resource_name = %event.resource_name,
            action = %event.action,
            "Running command"
        );

        let exit_code = self
            .runner
            .run(&self.program, &self.args)
            .await
            .map_err(|source| HandlerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        match exit_code {
            Some(0) => {
                debug!(program = %self.program, "Command finished");
                Ok(())
            }
            Some(code) => Err(HandlerError::Exit {
                program: self.program.clone(),
                status: format!("status {code}"),
            }),
            None => Err(HandlerError::Exit {
                program: self.program.clone(),
                status: "a signal".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventAction;
    use crate::test_utils::{RecordingRunner, event};

    fn handler(command_line: &str, runner: &Arc<RecordingRunner>) -> CommandHandler {
        CommandHandler::new(
            Trigger::new("update", "default/x"),
            command_line,
            Arc::clone(runner) as Arc<dyn CommandRunner>,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_splits_command_line_on_whitespace() {
        let runner = Arc::new(RecordingRunner::default());
        let handler = handler("  kubectl   get pods\t-A ", &runner);

        assert!(handler.handle(&event(EventAction::Update, "default/x")).await);

        assert_eq!(
            runner.calls(),
            vec![("kubectl".to_string(), vec!["get".to_string(), "pods".to_string(), "-A".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_ignores_non_matching_event() {
        let runner = Arc::new(RecordingRunner::default());
        let handler = handler("echo hi", &runner);

        assert!(!handler.handle(&event(EventAction::Update, "default/y")).await);
        assert!(!handler.handle(&event(EventAction::Create, "default/x")).await);

        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_propagated() {
        let runner = Arc::new(RecordingRunner::failing_with(Some(3)));
        let handler = handler("false", &runner);

        let result = handler.react(&event(EventAction::Update, "default/x")).await;
        assert!(matches!(result, Err(HandlerError::Exit { ref status, .. }) if status == "status 3"));

        // handle() swallows the same failure
        assert!(handler.handle(&event(EventAction::Update, "default/x")).await);
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_empty_command_line_is_rejected() {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
        let result = CommandHandler::new(Trigger::new("update", "default/x"), "   ", runner);
        assert!(matches!(result, Err(HandlerError::InvalidOptions(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_exit_codes() {
        assert_eq!(ProcessRunner.run("true", &[]).await.unwrap(), Some(0));
        assert_eq!(ProcessRunner.run("false", &[]).await.unwrap(), Some(1));
        assert!(ProcessRunner.run("definitely-not-a-real-binary-4f2a", &[]).await.is_err());
    }
}
