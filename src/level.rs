use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Severity of a log record. Variants are totally ordered from `Debug`
/// (least severe) to `Error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Lenient parse used for the startup level setting.
    ///
    /// Only `DEBUG`, `WARN` and `ERROR` are recognized; anything else,
    /// including an absent value, yields `Info`.
    pub fn from_env_value(value: Option<&str>) -> Level {
        match value {
            Some("DEBUG") => Level::Debug,
            Some("WARN") => Level::Warn,
            Some("ERROR") => Level::Error,
            _ => Level::Info,
        }
    }

    fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            _ => Level::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse, case-insensitive. Unlike [`Level::from_env_value`] this
/// rejects unknown names.
impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            _ => Err(ConfigError::UnknownLevel(s.to_string())),
        }
    }
}

/// Minimum level shared by every emitting thread.
///
/// Set once at construction; read with relaxed ordering on each emit.
#[derive(Debug)]
pub struct AtomicLevel(AtomicU8);

impl AtomicLevel {
    pub fn new(level: Level) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    pub fn get(&self) -> Level {
        Level::from_u8(self.0.load(Ordering::Relaxed))
    }

    /// Whether a record at `level` passes the minimum.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_value_defaults_to_info() {
        assert_eq!(Level::from_env_value(None), Level::Info);
        assert_eq!(Level::from_env_value(Some("")), Level::Info);
        assert_eq!(Level::from_env_value(Some("INFO")), Level::Info);
        assert_eq!(Level::from_env_value(Some("debug")), Level::Info);
        assert_eq!(Level::from_env_value(Some("TRACE")), Level::Info);
    }

    #[test]
    fn env_value_recognizes_upper_case_names() {
        assert_eq!(Level::from_env_value(Some("DEBUG")), Level::Debug);
        assert_eq!(Level::from_env_value(Some("WARN")), Level::Warn);
        assert_eq!(Level::from_env_value(Some("ERROR")), Level::Error);
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn atomic_level_gates_lower_severities() {
        let level = AtomicLevel::new(Level::Warn);
        assert!(!level.enabled(Level::Debug));
        assert!(!level.enabled(Level::Info));
        assert!(level.enabled(Level::Warn));
        assert!(level.enabled(Level::Error));
        assert_eq!(level.get(), Level::Warn);
    }
}
