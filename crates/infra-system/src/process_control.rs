// Intervention actuator implementation
// reason: nix for stop/continue signals, renice for scheduling priority
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use thermoguard_core::application::constants::DEFAULT_NICE_VALUE;
use thermoguard_core::domain::{Intervention, ProcessId};
use thermoguard_core::port::{ActuatorError, InterventionActuator};

use crate::subprocess_executor::{SubprocessError, SubprocessExecutor};

const RENICE: &str = "renice";

/// Actuator using SIGSTOP/SIGCONT and `renice`
pub struct SignalActuator {
    low_priority: i32,
    executor: SubprocessExecutor,
    command_timeout: Duration,
}

impl SignalActuator {
    /// Create an actuator
    ///
    /// # Arguments
    /// * `low_priority` - nice value applied by `lower_priority`
    /// * `command_timeout` - ceiling for each `renice` invocation
    pub fn new(low_priority: i32, command_timeout: Duration) -> Self {
        Self {
            low_priority,
            executor: SubprocessExecutor::default(),
            command_timeout,
        }
    }

    /// Set an absolute nice value (`renice <prio> -p <pid>`)
    async fn renice(
        &self,
        action: Intervention,
        pid: ProcessId,
        priority: i32,
    ) -> Result<(), ActuatorError> {
        let args = vec![priority.to_string(), "-p".to_string(), pid.to_string()];
        let output = self
            .executor
            .run(RENICE, &args, self.command_timeout)
            .await
            .map_err(|e| match e {
                SubprocessError::Timeout(ms) => ActuatorError::Timeout(ms),
                other => ActuatorError::CommandFailed(other.to_string()),
            })?;

        if output.success {
            info!(pid = %pid, priority = %priority, "Process priority changed");
            return Ok(());
        }
        Err(classify_renice_failure(action, pid, &output.stderr))
    }

    #[cfg(unix)]
    fn send_signal(&self, action: Intervention, pid: ProcessId) -> Result<(), ActuatorError> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let signal = match action {
            Intervention::Suspend => Signal::SIGSTOP,
            Intervention::Resume => Signal::SIGCONT,
            other => {
                return Err(ActuatorError::CommandFailed(format!(
                    "{} is not a signal action",
                    other
                )))
            }
        };

        let raw = i32::try_from(pid).map_err(|_| ActuatorError::NoSuchProcess(pid))?;

        info!(pid = %pid, signal = ?signal, "Sending signal");
        kill(Pid::from_raw(raw), signal).map_err(|errno| match errno {
            Errno::EPERM => ActuatorError::PermissionDenied { action, pid },
            Errno::ESRCH => ActuatorError::NoSuchProcess(pid),
            other => ActuatorError::CommandFailed(format!("kill({:?}) failed: {}", signal, other)),
        })
    }

    #[cfg(not(unix))]
    fn send_signal(&self, action: Intervention, _pid: ProcessId) -> Result<(), ActuatorError> {
        Err(ActuatorError::CommandFailed(format!(
            "{} is not supported on this platform",
            action
        )))
    }
}

#[async_trait]
impl InterventionActuator for SignalActuator {
    async fn lower_priority(&self, pid: ProcessId) -> Result<(), ActuatorError> {
        self.renice(Intervention::LowerPriority, pid, self.low_priority)
            .await
    }

    async fn restore_priority(&self, pid: ProcessId) -> Result<(), ActuatorError> {
        self.renice(Intervention::RestorePriority, pid, DEFAULT_NICE_VALUE)
            .await
    }

    async fn suspend(&self, pid: ProcessId) -> Result<(), ActuatorError> {
        self.send_signal(Intervention::Suspend, pid)
    }

    async fn resume(&self, pid: ProcessId) -> Result<(), ActuatorError> {
        self.send_signal(Intervention::Resume, pid)
    }
}

/// Map renice stderr to an actuator error
fn classify_renice_failure(action: Intervention, pid: ProcessId, stderr: &str) -> ActuatorError {
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("permission denied") || lower.contains("operation not permitted") {
        ActuatorError::PermissionDenied { action, pid }
    } else if lower.contains("no such process") {
        ActuatorError::NoSuchProcess(pid)
    } else {
        ActuatorError::CommandFailed(format!("renice: {}", stderr))
    }
}
