// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Unimetrics";

/// Application name in lowercase (for paths, identifiers, default namespace)
pub const APP_NAME_LOWER: &str = "unimetrics";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".unimetrics";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "unimetrics.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "UNIMETRICS_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "UNIMETRICS_LOG";

/// Environment variable for the server name dimension
pub const ENV_SERVER_NAME: &str = "UNIMETRICS_SERVER_NAME";

/// Environment variable for the enabled driver list (comma separated)
pub const ENV_DRIVERS: &str = "UNIMETRICS_DRIVERS";

/// Host name fallback for the server name
pub const ENV_HOSTNAME: &str = "HOSTNAME";

// =============================================================================
// Agent Defaults
// =============================================================================

/// Server name used when neither config nor environment provide one
pub const DEFAULT_SERVER_NAME: &str = "unknown";

/// Base dimension carrying the server name, always first
pub const SERVER_DIMENSION: &str = "server";

/// Default driver when none is configured
pub const DEFAULT_DRIVER: &str = "console";

/// Default push interval for every driver
pub const DEFAULT_CONSOLE_PUSH_INTERVAL_SECS: u64 = 10;

/// Consecutive failed cycles before a warning is logged (0 = never)
pub const DEFAULT_FAILURE_WARN_THRESHOLD: u64 = 10;

/// Seconds a driver gets to finish its in-flight cycle on close
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;
