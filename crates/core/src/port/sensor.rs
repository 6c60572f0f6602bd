// Temperature Sensor Port
// Abstraction over the thermal source (sysfs file, vendor command, test stub)

use crate::domain::Reading;
use async_trait::async_trait;
use thiserror::Error;

/// Reasons a sensor read produced no value
///
/// Never surfaces to the guard: adapters log it and return
/// `Reading::Unavailable`.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("No sensor source found")]
    NoSource,

    #[error("Failed to read {source_name}: {detail}")]
    Read { source_name: String, detail: String },

    #[error("Failed to parse value from {source_name}: {detail}")]
    Parse { source_name: String, detail: String },

    #[error("Sensor read timed out after {0}ms")]
    Timeout(u128),
}

/// Temperature Sensor trait
///
/// Implementations:
/// - SysfsSensor: reads thermal zone / battery files
/// - CommandSensor: runs a vendor tool and parses its stdout
#[async_trait]
pub trait TemperatureSensor: Send + Sync {
    /// Read the current temperature in whole degrees Celsius
    ///
    /// Must not block for long and must not fail: any problem is
    /// `Reading::Unavailable`.
    async fn read_temperature(&self) -> Reading;

    /// Human-readable description of the source (for the startup banner)
    fn describe(&self) -> String;
}

/// Normalize a raw sensor value to whole degrees Celsius
///
/// - `|raw| >= 1000`: millidegrees (sysfs thermal zones)
/// - `|raw| >= 200`: decidegrees (Android battery `temp`)
/// - otherwise: degrees
///
/// Fractions truncate toward zero.
pub fn normalize_raw(raw: f64) -> i32 {
    let degrees = if raw.abs() >= 1000.0 {
        raw / 1000.0
    } else if raw.abs() >= 200.0 {
        raw / 10.0
    } else {
        raw
    };
    degrees.trunc() as i32
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock sensor replaying a fixed sequence of readings
    ///
    /// Once the script is exhausted the last reading repeats.
    pub struct ScriptedSensor {
        script: Arc<Mutex<VecDeque<Reading>>>,
        last: Arc<Mutex<Reading>>,
        delay: Option<Duration>,
    }
    impl ScriptedSensor {
        pub fn new(readings: impl IntoIterator<Item = Reading>) -> Self {
            Self {
                script: Arc::new(Mutex::new(readings.into_iter().collect())),
                last: Arc::new(Mutex::new(Reading::Unavailable)),
                delay: None,
            }
        }
        pub fn celsius(values: &[i32]) -> Self {
            Self::new(values.iter().map(|v| Reading::Celsius(*v)))
        }
        /// Sensor that hangs for `delay` before answering
        pub fn hanging(delay: Duration, reading: Reading) -> Self {
            let mut sensor = Self::new([reading]);
            sensor.delay = Some(delay);
            sensor
        }
    }
    #[async_trait]
    impl TemperatureSensor for ScriptedSensor {
        async fn read_temperature(&self) -> Reading {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(reading) = next {
                *last = reading;
            }
            *last
        }
        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }
}
