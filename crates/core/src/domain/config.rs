// Guard Configuration (immutable for the process lifetime)

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{DomainError, Result};
use super::policy::Policy;
use super::thermal::Thresholds;

/// Default warning threshold in degrees Celsius
pub const DEFAULT_WARNING_THRESHOLD: i32 = 75;

/// Default critical threshold in degrees Celsius
pub const DEFAULT_CRITICAL_THRESHOLD: i32 = 82;

/// Default sampling interval (10s)
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_secs(10);

/// Default process name filter
pub const DEFAULT_TARGET_PROCESS: &str = "claude";

/// Default log destination (falls back to the temp dir when unwritable)
pub const DEFAULT_LOG_DESTINATION: &str = "/var/log/thermal-guard.log";

/// Default ceiling for any single sensor/locator/actuator call (3s)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Default nice value applied when lowering priority
pub const DEFAULT_LOW_PRIORITY: i32 = 10;

/// Unvalidated settings, as collected from the command line
#[derive(Debug, Clone)]
pub struct GuardSettings {
    pub warning_threshold: i32,
    pub critical_threshold: i32,
    pub sampling_interval: Duration,
    pub target_process: String,
    pub policy: Policy,
    pub log_destination: PathBuf,
    pub operation_timeout: Duration,
    pub low_priority: i32,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            target_process: DEFAULT_TARGET_PROCESS.to_string(),
            policy: Policy::default(),
            log_destination: PathBuf::from(DEFAULT_LOG_DESTINATION),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            low_priority: DEFAULT_LOW_PRIORITY,
        }
    }
}

/// Validated guard configuration
///
/// Construction is the only validation point: once a `GuardConfig` exists,
/// `warning < critical` holds, durations are positive and the target name
/// is non-empty.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    thresholds: Thresholds,
    sampling_interval: Duration,
    target_process: String,
    policy: Policy,
    log_destination: PathBuf,
    operation_timeout: Duration,
    low_priority: i32,
}

impl GuardConfig {
    /// Validate settings into a configuration
    ///
    /// # Errors
    /// - `DomainError::InvalidThresholds` if `warning >= critical`
    /// - `DomainError::InvalidDuration` if an interval or timeout is zero
    /// - `DomainError::EmptyProcessName` if the filter is blank
    /// - `DomainError::InvalidLowPriority` if the nice value is outside 1..=19
    pub fn new(settings: GuardSettings) -> Result<Self> {
        let thresholds = Thresholds::new(settings.warning_threshold, settings.critical_threshold)?;

        if settings.sampling_interval.is_zero() {
            return Err(DomainError::InvalidDuration {
                field: "sampling_interval",
            });
        }
        if settings.operation_timeout.is_zero() {
            return Err(DomainError::InvalidDuration {
                field: "operation_timeout",
            });
        }

        let target_process = settings.target_process.trim().to_string();
        if target_process.is_empty() {
            return Err(DomainError::EmptyProcessName);
        }

        if !(1..=19).contains(&settings.low_priority) {
            return Err(DomainError::InvalidLowPriority(settings.low_priority));
        }

        Ok(Self {
            thresholds,
            sampling_interval: settings.sampling_interval,
            target_process,
            policy: settings.policy,
            log_destination: settings.log_destination,
            operation_timeout: settings.operation_timeout,
            low_priority: settings.low_priority,
        })
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn sampling_interval(&self) -> Duration {
        self.sampling_interval
    }

    pub fn target_process(&self) -> &str {
        &self.target_process
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn log_destination(&self) -> &Path {
        &self.log_destination
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn low_priority(&self) -> i32 {
        self.low_priority
    }
}
