use crate::errors::RelayError;
use crate::services::logger::Logger;
use crate::services::normalizer::ExecutableCommand;
use crate::utils::redact::redact_text;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;

const LOG_PREVIEW_BYTES: usize = 512;

/// What one external command produced. A non-zero `returncode` is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub command: String,
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.returncode == 0
    }

    /// Shape exposed to callers of the service surface.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "executed_at": self.executed_at.to_rfc3339(),
            "returncode": self.returncode,
            "stdout": self.stdout,
            "stderr": self.stderr,
        })
    }
}

#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &ExecutableCommand) -> Result<ExecutionOutcome, RelayError>;
}

/// Runs the command as a child process, arguments passed literally (no shell).
#[derive(Clone)]
pub struct ProcessExecutor {
    logger: Logger,
    program_override: Option<PathBuf>,
}

impl ProcessExecutor {
    pub fn new(logger: Logger, program_override: Option<PathBuf>) -> Self {
        Self {
            logger: logger.child("exec"),
            program_override,
        }
    }

    fn program(&self, command: &ExecutableCommand) -> PathBuf {
        self.program_override
            .clone()
            .unwrap_or_else(|| PathBuf::from(command.program()))
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, command: &ExecutableCommand) -> Result<ExecutionOutcome, RelayError> {
        let program = self.program(command);
        let executed_at = Utc::now();
        self.logger.debug(
            "spawn",
            Some(&serde_json::json!({
                "program": program,
                "command": redact_text(command.line(), LOG_PREVIEW_BYTES, None),
            })),
        );

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(command.args());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|err| {
            RelayError::unavailable(format!(
                "The '{}' executable is not installed or not on PATH: {}",
                program.display(),
                err
            ))
            .with_hint("Install curl or point STARTSERVER_CURL_BIN at a curl binary.")
        })?;
        let output = child.wait_with_output().await.map_err(|err| {
            RelayError::unavailable(format!("Failed to wait for process: {}", err))
        })?;

        let outcome = ExecutionOutcome {
            command: command.line().to_string(),
            returncode: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            executed_at,
        };
        self.logger.debug(
            "exited",
            Some(&serde_json::json!({
                "returncode": outcome.returncode,
                "stdout_bytes": output.stdout.len(),
                "stderr_bytes": output.stderr.len(),
            })),
        );
        Ok(outcome)
    }
}
