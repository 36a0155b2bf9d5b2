// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
///
/// Flat keys map directly onto the environment: `FILESERVE_ROOT` -> `root`,
/// `FILESERVE_IP` -> `ip`, `FILESERVE_PORT` -> `port`, `SIGN_SECRET` -> `secret`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory all request paths are resolved against (no trailing slash after validation)
    pub root: String,
    /// Bind IP, empty for all interfaces
    pub ip: String,
    pub port: u16,
    /// Shared signing secret, empty disables write verification
    pub secret: String,
    /// Tokio worker threads, CPU cores when unset
    #[serde(default)]
    pub workers: Option<usize>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_timeout: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: false,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}
