// Thermal Domain Model - readings, thresholds and derived state

use super::error::{DomainError, Result};

/// One sensor sample, in whole degrees Celsius
///
/// Produced fresh every tick and never cached across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Celsius(i32),
    /// Sensor missing, unreadable, unparseable or timed out
    Unavailable,
}

impl Reading {
    pub fn degrees(&self) -> Option<i32> {
        match self {
            Reading::Celsius(d) => Some(*d),
            Reading::Unavailable => None,
        }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Celsius(d) => write!(f, "{}°C", d),
            Reading::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Warning/critical boundaries (`warning < critical` always holds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    warning: i32,
    critical: i32,
}

impl Thresholds {
    pub fn new(warning: i32, critical: i32) -> Result<Self> {
        if warning >= critical {
            return Err(DomainError::InvalidThresholds { warning, critical });
        }
        Ok(Self { warning, critical })
    }

    pub fn warning(&self) -> i32 {
        self.warning
    }

    pub fn critical(&self) -> i32 {
        self.critical
    }

    /// Derive the thermal state for a reading
    ///
    /// Strict inequalities evaluated fresh every tick; there is no
    /// hysteresis band or dwell time.
    pub fn classify(&self, reading: Reading) -> ThermalState {
        match reading {
            Reading::Unavailable => ThermalState::Unknown,
            Reading::Celsius(t) if t >= self.critical => ThermalState::Critical,
            Reading::Celsius(t) if t >= self.warning => ThermalState::Warning,
            Reading::Celsius(_) => ThermalState::Normal,
        }
    }
}

/// Thermal state derived from a single reading (never stored)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalState {
    Normal,
    Warning,
    Critical,
    Unknown,
}

impl std::fmt::Display for ThermalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThermalState::Normal => write!(f, "NORMAL"),
            ThermalState::Warning => write!(f, "WARNING"),
            ThermalState::Critical => write!(f, "CRITICAL"),
            ThermalState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
