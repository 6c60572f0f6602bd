// Guard constants (no magic values)

/// Nice value restored by `restore_priority`
pub const DEFAULT_NICE_VALUE: i32 = 0;

/// Log file name used when the configured destination is unwritable
pub const FALLBACK_LOG_FILE_NAME: &str = "thermal-guard.log";
