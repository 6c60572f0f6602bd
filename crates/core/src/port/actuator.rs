// Intervention Actuator Port
// Applies or reverses priority changes and stop/continue signals

use crate::domain::{Intervention, ProcessId};
use async_trait::async_trait;
use thiserror::Error;

/// Actuator errors (never fatal to the guard loop)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("Permission denied for {action} on pid {pid}")]
    PermissionDenied { action: Intervention, pid: ProcessId },

    #[error("No such process: {0}")]
    NoSuchProcess(ProcessId),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Operation timeout after {0}ms")]
    Timeout(u128),
}

/// Intervention Actuator trait
///
/// Every operation is best-effort and idempotent: repeating it on an
/// already-modified process is harmless.
#[async_trait]
pub trait InterventionActuator: Send + Sync {
    /// Set scheduling priority to the configured low value
    async fn lower_priority(&self, pid: ProcessId) -> Result<(), ActuatorError>;

    /// Set scheduling priority back to the default
    async fn restore_priority(&self, pid: ProcessId) -> Result<(), ActuatorError>;

    /// Deliver a stop signal
    async fn suspend(&self, pid: ProcessId) -> Result<(), ActuatorError>;

    /// Deliver a continue signal
    async fn resume(&self, pid: ProcessId) -> Result<(), ActuatorError>;

    /// Dispatch an intervention to the matching operation
    async fn apply(&self, action: Intervention, pid: ProcessId) -> Result<(), ActuatorError> {
        match action {
            Intervention::LowerPriority => self.lower_priority(pid).await,
            Intervention::RestorePriority => self.restore_priority(pid).await,
            Intervention::Suspend => self.suspend(pid).await,
            Intervention::Resume => self.resume(pid).await,
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock actuator recording every call in order
    pub struct RecordingActuator {
        calls: Arc<Mutex<Vec<(Intervention, ProcessId)>>>,
        failures: Arc<Mutex<HashMap<Intervention, ActuatorError>>>,
        delay: Option<Duration>,
    }
    impl RecordingActuator {
        pub fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                failures: Arc::new(Mutex::new(HashMap::new())),
                delay: None,
            }
        }
        /// Actuator whose every call hangs for `delay`
        pub fn hanging(delay: Duration) -> Self {
            let mut actuator = Self::new();
            actuator.delay = Some(delay);
            actuator
        }
        /// Make `action` fail with `error` until cleared
        pub fn fail_on(&self, action: Intervention, error: ActuatorError) {
            self.failures.lock().unwrap().insert(action, error);
        }
        pub fn clear_failures(&self) {
            self.failures.lock().unwrap().clear();
        }
        pub fn calls(&self) -> Vec<(Intervention, ProcessId)> {
            self.calls.lock().unwrap().clone()
        }
        pub fn actions(&self) -> Vec<Intervention> {
            self.calls().into_iter().map(|(action, _)| action).collect()
        }
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
        async fn record(&self, action: Intervention, pid: ProcessId) -> Result<(), ActuatorError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push((action, pid));
            match self.failures.lock().unwrap().get(&action) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }
    impl Default for RecordingActuator {
        fn default() -> Self {
            Self::new()
        }
    }
    #[async_trait]
    impl InterventionActuator for RecordingActuator {
        async fn lower_priority(&self, pid: ProcessId) -> Result<(), ActuatorError> {
            self.record(Intervention::LowerPriority, pid).await
        }
        async fn restore_priority(&self, pid: ProcessId) -> Result<(), ActuatorError> {
            self.record(Intervention::RestorePriority, pid).await
        }
        async fn suspend(&self, pid: ProcessId) -> Result<(), ActuatorError> {
            self.record(Intervention::Suspend, pid).await
        }
        async fn resume(&self, pid: ProcessId) -> Result<(), ActuatorError> {
            self.record(Intervention::Resume, pid).await
        }
    }
}
