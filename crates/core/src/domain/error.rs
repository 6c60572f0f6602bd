// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid thresholds: warning ({warning}) must be below critical ({critical})")]
    InvalidThresholds { warning: i32, critical: i32 },

    #[error("Invalid duration for {field}: must be positive")]
    InvalidDuration { field: &'static str },

    #[error("Target process name must not be empty")]
    EmptyProcessName,

    #[error("Invalid policy: {0} (expected warn, nice or pause)")]
    InvalidPolicy(String),

    #[error("Invalid low priority {0}: expected a nice value in 1..=19")]
    InvalidLowPriority(i32),
}

pub type Result<T> = std::result::Result<T, DomainError>;
