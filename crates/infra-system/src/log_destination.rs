// Log destination resolution with a one-time fallback
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use thermoguard_core::application::constants::FALLBACK_LOG_FILE_NAME;
use thermoguard_core::error::{AppError, Result};

/// An opened, append-mode log file
#[derive(Debug)]
pub struct LogDestination {
    pub path: PathBuf,
    pub file: File,
    /// Set when the configured path was unwritable: (configured path, reason)
    pub fallback_from: Option<(PathBuf, String)>,
}

/// Open `configured` for appending, falling back to `<tmp>/thermal-guard.log`
///
/// # Errors
/// `AppError::LogDestination` when neither location is writable
pub fn resolve_log_destination(configured: &Path) -> Result<LogDestination> {
    let fallback = std::env::temp_dir().join(FALLBACK_LOG_FILE_NAME);
    resolve_with_fallback(configured, &fallback)
}

fn resolve_with_fallback(configured: &Path, fallback: &Path) -> Result<LogDestination> {
    let reason = match open_append(configured) {
        Ok(file) => {
            return Ok(LogDestination {
                path: configured.to_path_buf(),
                file,
                fallback_from: None,
            })
        }
        Err(e) => e.to_string(),
    };

    match open_append(fallback) {
        Ok(file) => Ok(LogDestination {
            path: fallback.to_path_buf(),
            file,
            fallback_from: Some((configured.to_path_buf(), reason)),
        }),
        Err(e) => Err(AppError::LogDestination(format!(
            "{} ({}); fallback {} ({})",
            configured.display(),
            reason,
            fallback.display(),
            e
        ))),
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "thermoguard_log_{}_{}",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_configured_path_used_when_writable() {
        let dir = scratch("ok");
        let path = dir.join("nested/guard.log");

        let dest = resolve_log_destination(&path).unwrap();

        assert_eq!(dest.path, path);
        assert!(dest.fallback_from.is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_appends_rather_than_truncates() {
        let dir = scratch("append");
        let path = dir.join("guard.log");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "[2026-01-01 00:00:00] [INFO] first\n").unwrap();

        let mut dest = resolve_log_destination(&path).unwrap();
        writeln!(dest.file, "[2026-01-01 00:00:10] [INFO] second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_falls_back_when_unwritable() {
        let fallback = scratch("fallback").join("guard.log");

        let dest =
            resolve_with_fallback(Path::new("/proc/thermoguard/guard.log"), &fallback).unwrap();

        assert_eq!(dest.path, fallback);
        let (configured, _reason) = dest.fallback_from.unwrap();
        assert_eq!(configured, PathBuf::from("/proc/thermoguard/guard.log"));
        let _ = std::fs::remove_dir_all(fallback.parent().unwrap());
    }

    #[test]
    fn test_no_writable_location_is_error() {
        let result = resolve_with_fallback(
            Path::new("/proc/thermoguard/a.log"),
            Path::new("/proc/thermoguard/b.log"),
        );

        assert!(matches!(result, Err(AppError::LogDestination(_))));
    }
}
