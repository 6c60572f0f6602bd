// Event Reporter Port (Logger/Reporter)

use crate::domain::log_entry::LOG_TIMESTAMP_FORMAT;
use crate::domain::{LogEntry, Severity};
use tracing::{error, info, warn};

/// Event field carrying the entry's own timestamp
///
/// Line formatters print it in place of the time the event was rendered.
pub const LOGGED_AT_FIELD: &str = "logged_at";

/// Sink for guard events
///
/// Implementations must append in call order and never drop or rewrite
/// entries.
pub trait EventReporter: Send + Sync {
    fn report(&self, entry: &LogEntry);
}

/// Production reporter: forwards entries to `tracing`
///
/// The subscriber installed by the daemon renders them as
/// `[timestamp] [LEVEL] message` on the console and in the log file, with
/// the timestamp taken from the entry (see [`LOGGED_AT_FIELD`]).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl EventReporter for TracingReporter {
    fn report(&self, entry: &LogEntry) {
        let logged_at = entry.timestamp.format(LOG_TIMESTAMP_FORMAT);
        match entry.severity {
            Severity::Info => info!(target: "thermal_guard", logged_at = %logged_at, "{}", entry.message),
            Severity::Warn => warn!(target: "thermal_guard", logged_at = %logged_at, "{}", entry.message),
            Severity::Error => error!(target: "thermal_guard", logged_at = %logged_at, "{}", entry.message),
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory reporter capturing every entry
    #[derive(Default)]
    pub struct MemoryReporter {
        entries: Arc<Mutex<Vec<LogEntry>>>,
    }
    impl MemoryReporter {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn entries(&self) -> Vec<LogEntry> {
            self.entries.lock().unwrap().clone()
        }
        pub fn severities(&self) -> Vec<Severity> {
            self.entries().into_iter().map(|e| e.severity).collect()
        }
        pub fn max_severity(&self) -> Option<Severity> {
            self.severities().into_iter().max()
        }
        pub fn contains(&self, needle: &str) -> bool {
            self.entries().iter().any(|e| e.message.contains(needle))
        }
        pub fn clear(&self) {
            self.entries.lock().unwrap().clear();
        }
    }
    impl EventReporter for MemoryReporter {
        fn report(&self, entry: &LogEntry) {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}
