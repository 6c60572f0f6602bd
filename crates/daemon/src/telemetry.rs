//! Logging setup
//!
//! Every event is written twice: to the console and, through a
//! non-blocking appender, to the resolved log file. Both use the
//! `[timestamp] [LEVEL] message` line format.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `info`)
//! - `THERMAL_GUARD_LOG_FORMAT`: `json` switches the console to JSON lines;
//!   the file keeps the plain line format

use anyhow::Result;
use std::fmt::{self, Write as _};
use std::fs::File;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thermoguard_core::domain::log_entry::LOG_TIMESTAMP_FORMAT;
use thermoguard_core::port::LOGGED_AT_FIELD;

/// `[timestamp] [LEVEL] message key=value...`
///
/// The timestamp is the event's `logged_at` field when present (guard
/// entries carry their own), otherwise the render time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

/// Event fields split into the line's parts
#[derive(Default)]
struct LineFields {
    logged_at: Option<String>,
    message: String,
    extra: String,
}

impl Visit for LineFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            LOGGED_AT_FIELD => self.logged_at = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => {
                let _ = write!(self.extra, " {}={}", name, value);
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            LOGGED_AT_FIELD => self.logged_at = Some(format!("{:?}", value)),
            "message" => self.message = format!("{:?}", value),
            name => {
                let _ = write!(self.extra, " {}={:?}", name, value);
            }
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = match *event.metadata().level() {
            Level::ERROR => "ERROR",
            Level::WARN => "WARN",
            Level::INFO => "INFO",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
        };
        let mut fields = LineFields::default();
        event.record(&mut fields);
        let timestamp = fields
            .logged_at
            .unwrap_or_else(|| chrono::Local::now().format(LOG_TIMESTAMP_FORMAT).to_string());

        writeln!(
            writer,
            "[{}] [{}] {}{}",
            timestamp, level, fields.message, fields.extra
        )
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive
/// until the process exits.
pub fn init_logging(log_file: File) -> Result<WorkerGuard> {
    let (file_writer, guard) = tracing_appender::non_blocking(log_file);

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(file_writer)
        .with_ansi(false);

    let log_format = std::env::var("THERMAL_GUARD_LOG_FORMAT").unwrap_or_default();

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().event_format(LineFormat))
                .try_init()?;
        }
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use std::io;
    use thermoguard_core::domain::{LogEntry, Severity};
    use thermoguard_core::port::time_provider::{FixedTimeProvider, TimeProvider};
    use thermoguard_core::port::{EventReporter, TracingReporter};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_writer(move || writer.clone())
                .with_ansi(false),
        );
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_guard_entry_keeps_its_timestamp() {
        let at = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let clock = FixedTimeProvider(at);
        let entry = LogEntry::new(clock.now(), Severity::Warn, "Temperature 76°C [WARNING]");

        let out = capture(|| TracingReporter.report(&entry));

        assert_eq!(out, format!("{}\n", entry));
        assert_eq!(out, "[2026-01-02 03:04:05] [WARN] Temperature 76°C [WARNING]\n");
        assert!(!out.contains(LOGGED_AT_FIELD));
    }

    #[test]
    fn test_line_format() {
        let out = capture(|| {
            tracing::warn!("Temperature 76°C [WARNING]");
            tracing::error!(pid = 42, "Failed to apply suspend");
        });

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        // [YYYY-MM-DD HH:MM:SS] is 21 chars
        assert!(lines[0].starts_with('['));
        assert_eq!(&lines[0][20..21], "]");
        assert!(lines[0].ends_with("[WARN] Temperature 76°C [WARNING]"));
        assert!(lines[1].contains("[ERROR] Failed to apply suspend pid=42"));
    }
}
