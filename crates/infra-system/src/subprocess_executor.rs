// Subprocess executor for external tools (renice, vendor sensor commands)
// reason: tokio::process so a hung tool can be bounded by a timeout
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Environment variables passed through to child processes
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "LANG", "PREFIX"];

#[derive(Error, Debug)]
pub enum SubprocessError {
    #[error("Spawn failed for {command}: {detail}")]
    SpawnFailed { command: String, detail: String },

    #[error("Process timeout after {0}ms")]
    Timeout(u128),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs short-lived helper commands with an allowlisted environment
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    env_allowlist: Vec<String>,
}

impl SubprocessExecutor {
    /// Create a new subprocess executor
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(vec!["PATH".to_string()]);
    /// let out = executor.run("renice", &["10".into(), "-p".into(), "42".into()], timeout).await?;
    /// ```
    pub fn new(env_allowlist: Vec<String>) -> Self {
        Self { env_allowlist }
    }

    /// Filter the current environment to the allowlist
    fn filtered_env(&self) -> Vec<(String, String)> {
        std::env::vars()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    /// Run `command` to completion, killing it if `limit` elapses
    pub async fn run(
        &self,
        command: &str,
        args: &[String],
        limit: Duration,
    ) -> Result<CommandOutput, SubprocessError> {
        debug!(command = %command, args = ?args, "Running helper command");

        let child = Command::new(command)
            .args(args)
            .env_clear()
            .envs(self.filtered_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SubprocessError::SpawnFailed {
                command: command.to_string(),
                detail: e.to_string(),
            })?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(SubprocessError::IoError(e.to_string())),
            Err(_) => return Err(SubprocessError::Timeout(limit.as_millis())),
        };

        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        debug!(
            command = %command,
            exit_code = ?result.exit_code,
            "Helper command completed"
        );

        Ok(result)
    }
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect())
    }
}
