use crate::field::Field;
use crate::level::Level;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::panic::Location;

/// One emitted log line. Built per emit call, written once and dropped.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub caller: Option<&'static Location<'static>>,
    pub fields: Vec<Field>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            caller: None,
            fields,
        }
    }

    pub fn with_caller(mut self, caller: &'static Location<'static>) -> Self {
        self.caller = Some(caller);
        self
    }

    /// First field with the given key, if any.
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Serialized as one flat JSON object: `level`, `ts`, `caller`, `msg`,
/// then every field in order. Repeated field keys are written repeatedly.
impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 4))?;
        map.serialize_entry("level", self.level.as_str())?;
        map.serialize_entry(
            "ts",
            &self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        if let Some(caller) = self.caller {
            map.serialize_entry("caller", &format!("{}:{}", caller.file(), caller.line()))?;
        }
        map.serialize_entry("msg", &self.message)?;
        for field in &self.fields {
            map.serialize_entry(&field.key, &field.value)?;
        }
        map.end()
    }
}
