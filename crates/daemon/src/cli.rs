//! Command-line configuration
//!
//! Every flag is optional and may also come from a `THERMAL_GUARD_*`
//! environment variable. Validation happens in `GuardConfig::new`; this
//! module only collects values.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thermoguard_core::domain::config::{
    DEFAULT_CRITICAL_THRESHOLD, DEFAULT_LOG_DESTINATION, DEFAULT_LOW_PRIORITY,
    DEFAULT_TARGET_PROCESS, DEFAULT_WARNING_THRESHOLD,
};
use thermoguard_core::domain::{DomainError, GuardConfig, GuardSettings, Policy};
use thermoguard_core::error::AppError;
use thermoguard_core::port::TemperatureSensor;
use thermoguard_infra_system::{CommandSensor, SysfsSensor};

#[derive(Parser, Debug)]
#[command(name = "thermal-guard")]
#[command(about = "Throttle or pause a process while the device runs hot", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Warning threshold in °C
    #[arg(short, long, env = "THERMAL_GUARD_WARNING", default_value_t = DEFAULT_WARNING_THRESHOLD, allow_negative_numbers = true)]
    pub warning: i32,

    /// Critical threshold in °C (must be above the warning threshold)
    #[arg(short, long, env = "THERMAL_GUARD_CRITICAL", default_value_t = DEFAULT_CRITICAL_THRESHOLD, allow_negative_numbers = true)]
    pub critical: i32,

    /// Sampling interval in seconds
    #[arg(short, long, env = "THERMAL_GUARD_INTERVAL", default_value_t = 10)]
    pub interval: u64,

    /// Substring matched against process command lines
    #[arg(short, long, env = "THERMAL_GUARD_PROCESS", default_value = DEFAULT_TARGET_PROCESS)]
    pub process: String,

    /// Intervention ceiling: warn, nice or pause
    #[arg(long, env = "THERMAL_GUARD_POLICY", default_value = "warn")]
    pub policy: Policy,

    /// Log file (falls back to the temp dir when unwritable)
    #[arg(short, long, env = "THERMAL_GUARD_LOG_FILE", default_value = DEFAULT_LOG_DESTINATION)]
    pub log_file: String,

    /// Timeout in seconds for each sensor read, process lookup or action
    #[arg(long, env = "THERMAL_GUARD_TIMEOUT", default_value_t = 3)]
    pub timeout: u64,

    /// Nice value applied when lowering priority (1-19)
    #[arg(long, env = "THERMAL_GUARD_LOW_PRIORITY", default_value_t = DEFAULT_LOW_PRIORITY)]
    pub low_priority: i32,

    /// Read the temperature from this file instead of auto-discovery
    #[arg(long, env = "THERMAL_GUARD_SENSOR_PATH", conflicts_with = "sensor_command")]
    pub sensor_path: Option<PathBuf>,

    /// Read the temperature from this command's stdout
    #[arg(long, env = "THERMAL_GUARD_SENSOR_COMMAND")]
    pub sensor_command: Option<String>,
}

impl Cli {
    /// Collect flag values into unvalidated settings
    pub fn settings(&self) -> GuardSettings {
        GuardSettings {
            warning_threshold: self.warning,
            critical_threshold: self.critical,
            sampling_interval: Duration::from_secs(self.interval),
            target_process: self.process.clone(),
            policy: self.policy,
            log_destination: PathBuf::from(shellexpand::tilde(&self.log_file).into_owned()),
            operation_timeout: Duration::from_secs(self.timeout),
            low_priority: self.low_priority,
        }
    }

    /// Validate into the immutable guard configuration
    pub fn config(&self) -> Result<GuardConfig, DomainError> {
        GuardConfig::new(self.settings())
    }

    /// Pick the sensor source: command, explicit file, or discovery
    pub fn sensor(&self, read_timeout: Duration) -> Result<Arc<dyn TemperatureSensor>, AppError> {
        if let Some(command_line) = &self.sensor_command {
            let sensor = CommandSensor::from_command_line(command_line, read_timeout)
                .ok_or_else(|| AppError::Config("--sensor-command is empty".to_string()))?;
            return Ok(Arc::new(sensor));
        }
        if let Some(path) = &self.sensor_path {
            return Ok(Arc::new(SysfsSensor::new(path.clone(), read_timeout)));
        }
        Ok(Arc::new(SysfsSensor::discover(read_timeout)))
    }
}
