// process_runner.rs - External tool execution
// Purpose: Spawn a built command, wait for it, capture its output

use crate::command_builder::CommandLine;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// What one process produced
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Set when the process could not be launched or was killed on timeout
    pub error: Option<String>,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn failed(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            error: Some(error.into()),
            duration,
            ..Default::default()
        }
    }
}

/// Anything able to execute a command line. Must never fail the run:
/// launch errors are reported through `ProcessOutput::error`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, command: &CommandLine) -> ProcessOutput;
}

/// Runs commands as child processes, buffering all output until exit
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn execute(&self, command: &CommandLine) -> ProcessOutput {
        let start = Instant::now();

        let mut child = Command::new(&command.program);
        child
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Dropping the output future on timeout kills the child
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return ProcessOutput::failed(
                        format!("{} timed out after {:?}", command.program, limit),
                        start.elapsed(),
                    );
                }
            },
            None => child.output().await,
        };

        match output {
            Ok(output) => ProcessOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
                success: output.status.success(),
                error: None,
                duration: start.elapsed(),
            },
            Err(e) => ProcessOutput::failed(
                format!("failed to launch {}: {}", command.program, e),
                start.elapsed(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolKind;

    fn command(program: &str, args: &[&str]) -> CommandLine {
        CommandLine {
            tool: ToolKind::Curl,
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = ProcessRunner::default();
        let out = runner.execute(&command("echo", &["hello"])).await;
        assert!(out.success);
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(out.stdout.trim(), "hello");
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_captured() {
        let runner = ProcessRunner::default();
        let out = runner.execute(&command("sh", &["-c", "echo partial; exit 3"])).await;
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "partial");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_raised() {
        let runner = ProcessRunner::default();
        let out = runner
            .execute(&command("stealthhawk-no-such-binary", &[]))
            .await;
        assert!(!out.success);
        assert!(out.error.unwrap().contains("failed to launch"));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)));
        let out = runner.execute(&command("sleep", &["5"])).await;
        assert!(!out.success);
        assert!(out.error.unwrap().contains("timed out"));
        assert!(out.duration < Duration::from_secs(5));
    }
}
