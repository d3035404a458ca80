//! Environment variable names read at process start.
//!
//! These are helpers for `from_env` constructors; the core types take
//! explicit configuration and never read the environment themselves.

/// Minimum log level: `DEBUG`, `WARN` or `ERROR`. Anything else means `INFO`.
pub const LEVEL_ENV: &str = "FIELDLOG_LEVEL";

/// Error tracker endpoint URL.
pub const TRACKER_ENDPOINT_ENV: &str = "FIELDLOG_TRACKER_ENDPOINT";

/// Environment label attached to tracker events, e.g. `production`.
pub const TRACKER_ENVIRONMENT_ENV: &str = "FIELDLOG_TRACKER_ENVIRONMENT";

/// Release/version label attached to tracker events.
pub const TRACKER_RELEASE_ENV: &str = "FIELDLOG_TRACKER_RELEASE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
