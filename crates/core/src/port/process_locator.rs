// Process Locator Port

use crate::domain::ProcessId;
use async_trait::async_trait;

/// Resolves the pid of the managed process
#[async_trait]
pub trait ProcessLocator: Send + Sync {
    /// Find a process whose command line contains `name_filter`
    ///
    /// # Returns
    /// `None` when nothing matches (including permission errors). When
    /// several processes match, the choice is implementation-defined but
    /// deterministic.
    async fn find_process(&self, name_filter: &str) -> Option<ProcessId>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock locator returning a settable pid
    pub struct MockProcessLocator {
        pid: Arc<Mutex<Option<ProcessId>>>,
        lookups: Arc<Mutex<Vec<String>>>,
        delay: Option<Duration>,
    }
    impl MockProcessLocator {
        pub fn new(pid: Option<ProcessId>) -> Self {
            Self {
                pid: Arc::new(Mutex::new(pid)),
                lookups: Arc::new(Mutex::new(Vec::new())),
                delay: None,
            }
        }
        pub fn found(pid: ProcessId) -> Self {
            Self::new(Some(pid))
        }
        /// Locator that hangs for `delay` before answering `pid`
        pub fn hanging(delay: Duration, pid: ProcessId) -> Self {
            let mut locator = Self::found(pid);
            locator.delay = Some(delay);
            locator
        }
        pub fn set_pid(&self, pid: Option<ProcessId>) {
            *self.pid.lock().unwrap() = pid;
        }
        pub fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }
    #[async_trait]
    impl ProcessLocator for MockProcessLocator {
        async fn find_process(&self, name_filter: &str) -> Option<ProcessId> {
            self.lookups.lock().unwrap().push(name_filter.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            *self.pid.lock().unwrap()
        }
    }
}
