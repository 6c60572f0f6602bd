//! Temperature sensor adapters.
//!
//! - [`SysfsSensor`] reads `/sys/class/thermal/thermal_zone*/temp`
//!   (millidegrees) or an Android battery `temp` file (decidegrees).
//! - [`CommandSensor`] runs a vendor tool and parses its stdout, either a
//!   bare number or a JSON object carrying a `temperature` field (the
//!   `termux-battery-status` shape).
//!
//! Discovered sysfs sources carry their kernel unit. An explicit file or a
//! command has no known unit and is scaled by magnitude instead. Every
//! failure becomes `Reading::Unavailable`.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use thermoguard_core::domain::Reading;
use thermoguard_core::port::{normalize_raw, SensorError, TemperatureSensor};

use crate::subprocess_executor::{SubprocessError, SubprocessExecutor};

/// Directory holding the kernel thermal zones
const THERMAL_CLASS_DIR: &str = "/sys/class/thermal";

/// Battery temperature on Android-style kernels
const BATTERY_TEMP_PATH: &str = "/sys/class/power_supply/battery/temp";

/// Encoding of a raw sensor value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawUnit {
    /// Kernel thermal zones
    Millidegrees,
    /// Android battery `temp`
    Decidegrees,
    /// Source of unknown origin, scaled by magnitude
    Auto,
}

impl RawUnit {
    /// Convert to whole degrees, truncating toward zero
    pub fn to_degrees(self, raw: f64) -> i32 {
        match self {
            RawUnit::Millidegrees => (raw / 1000.0).trunc() as i32,
            RawUnit::Decidegrees => (raw / 10.0).trunc() as i32,
            RawUnit::Auto => normalize_raw(raw),
        }
    }
}

/// Reads a temperature from the first readable sysfs file
pub struct SysfsSensor {
    sources: Vec<(PathBuf, RawUnit)>,
    read_timeout: Duration,
}

impl SysfsSensor {
    /// Sensor bound to an explicit file of unknown unit
    pub fn new(path: impl Into<PathBuf>, read_timeout: Duration) -> Self {
        Self {
            sources: vec![(path.into(), RawUnit::Auto)],
            read_timeout,
        }
    }

    /// Sensor over every thermal zone (in zone order) plus battery temp
    ///
    /// Only the first readable source is sampled each tick.
    pub fn discover(read_timeout: Duration) -> Self {
        let sources = discovered_sources(Path::new(THERMAL_CLASS_DIR), Path::new(BATTERY_TEMP_PATH));
        debug!(candidates = ?sources, "Discovered sysfs temperature sources");
        Self {
            sources,
            read_timeout,
        }
    }

    async fn read_path(&self, path: &Path, unit: RawUnit) -> Result<i32, SensorError> {
        let source_name = path.display().to_string();
        let content = match tokio::time::timeout(self.read_timeout, tokio::fs::read_to_string(path))
            .await
        {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                return Err(SensorError::Read {
                    source_name,
                    detail: e.to_string(),
                })
            }
            Err(_) => return Err(SensorError::Timeout(self.read_timeout.as_millis())),
        };
        parse_raw_value(&content, unit).ok_or_else(|| SensorError::Parse {
            source_name,
            detail: format!("expected a number, got '{}'", content.trim()),
        })
    }

    async fn read(&self) -> Result<i32, SensorError> {
        let mut last_err = SensorError::NoSource;
        for (path, unit) in &self.sources {
            match self.read_path(path, *unit).await {
                Ok(degrees) => return Ok(degrees),
                Err(e) => {
                    debug!(error = %e, "Sensor source unreadable, trying next");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

#[async_trait]
impl TemperatureSensor for SysfsSensor {
    async fn read_temperature(&self) -> Reading {
        match self.read().await {
            Ok(degrees) => Reading::Celsius(degrees),
            Err(e) => {
                debug!(error = %e, "Temperature unavailable");
                Reading::Unavailable
            }
        }
    }

    fn describe(&self) -> String {
        match self.sources.as_slice() {
            [] => "sysfs (no source found)".to_string(),
            [(only, _)] => format!("sysfs {}", only.display()),
            [(first, _), rest @ ..] => {
                format!("sysfs {} (+{} fallbacks)", first.display(), rest.len())
            }
        }
    }
}

/// Reads a temperature by running an external command
pub struct CommandSensor {
    program: String,
    args: Vec<String>,
    executor: SubprocessExecutor,
    read_timeout: Duration,
}

impl CommandSensor {
    /// Build from a shell-like command line (`"termux-battery-status"`,
    /// `"vcgencmd measure_temp"`); arguments are split on whitespace.
    pub fn from_command_line(command_line: &str, read_timeout: Duration) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            executor: SubprocessExecutor::default(),
            read_timeout,
        })
    }

    async fn read(&self) -> Result<i32, SensorError> {
        let source_name = self.program.clone();
        let output = self
            .executor
            .run(&self.program, &self.args, self.read_timeout)
            .await
            .map_err(|e| match e {
                SubprocessError::Timeout(ms) => SensorError::Timeout(ms),
                other => SensorError::Read {
                    source_name: source_name.clone(),
                    detail: other.to_string(),
                },
            })?;

        if !output.success {
            return Err(SensorError::Read {
                source_name,
                detail: format!("exit code {:?}: {}", output.exit_code, output.stderr),
            });
        }

        parse_command_output(&output.stdout).ok_or_else(|| SensorError::Parse {
            source_name,
            detail: format!("no temperature in '{}'", output.stdout.trim()),
        })
    }
}

#[async_trait]
impl TemperatureSensor for CommandSensor {
    async fn read_temperature(&self) -> Reading {
        match self.read().await {
            Ok(degrees) => Reading::Celsius(degrees),
            Err(e) => {
                debug!(error = %e, "Temperature unavailable");
                Reading::Unavailable
            }
        }
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            format!("command {}", self.program)
        } else {
            format!("command {} {}", self.program, self.args.join(" "))
        }
    }
}

/// JSON shape emitted by battery-status style tools
#[derive(Debug, Deserialize)]
struct TemperatureReport {
    temperature: f64,
}

/// List `thermal_zone*/temp` files under `dir`, sorted by zone number
fn thermal_zone_paths(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut zones: Vec<(u32, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name();
            let index = name.to_str()?.strip_prefix("thermal_zone")?.parse().ok()?;
            let temp = e.path().join("temp");
            temp.exists().then_some((index, temp))
        })
        .collect();
    zones.sort_by_key(|(index, _)| *index);
    zones.into_iter().map(|(_, path)| path).collect()
}

/// Thermal zones (millidegrees) in zone order, then the battery file (decidegrees)
fn discovered_sources(thermal_dir: &Path, battery: &Path) -> Vec<(PathBuf, RawUnit)> {
    let mut sources: Vec<(PathBuf, RawUnit)> = thermal_zone_paths(thermal_dir)
        .into_iter()
        .map(|path| (path, RawUnit::Millidegrees))
        .collect();
    if battery.exists() {
        sources.push((battery.to_path_buf(), RawUnit::Decidegrees));
    }
    sources
}

/// Parse a raw sysfs value in the given unit
fn parse_raw_value(content: &str, unit: RawUnit) -> Option<i32> {
    let raw: f64 = content.trim().parse().ok()?;
    raw.is_finite().then(|| unit.to_degrees(raw))
}

/// Parse command stdout: JSON report, bare JSON number, or first numeric token
///
/// Tokens like `temp=48.3'C` are accepted by stripping non-numeric edges.
fn parse_command_output(stdout: &str) -> Option<i32> {
    let trimmed = stdout.trim();

    if let Ok(report) = serde_json::from_str::<TemperatureReport>(trimmed) {
        return report.temperature.is_finite().then(|| normalize_raw(report.temperature));
    }

    trimmed
        .split(|c: char| c.is_whitespace() || c == '=' || c == ':')
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_digit() && c != '-' && c != '.'))
        .filter(|token| !token.is_empty())
        .find_map(|token| token.parse::<f64>().ok())
        .filter(|raw| raw.is_finite())
        .map(normalize_raw)
}
