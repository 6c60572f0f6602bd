// Intervention Policy

use std::str::FromStr;

use super::error::DomainError;

/// Ceiling of intervention severity (Warn < Nice < Pause)
///
/// The policy bounds the worst-case impact on the managed process:
/// `Nice` never suspends, `Pause` never suspends below Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Policy {
    /// Log only, never touch the process
    #[default]
    Warn,
    /// Lower scheduling priority at Warning and above
    Nice,
    /// Suspend the process at Critical
    Pause,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Warn => "warn",
            Policy::Nice => "nice",
            Policy::Pause => "pause",
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(Policy::Warn),
            "nice" => Ok(Policy::Nice),
            "pause" => Ok(Policy::Pause),
            other => Err(DomainError::InvalidPolicy(other.to_string())),
        }
    }
}
