use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::clock::Clock;
use crate::error::LogDecodeError;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Low,
    Medium,
    High,
}

impl LogSeverity {
    pub const ALL: [LogSeverity; 3] = [LogSeverity::Low, LogSeverity::Medium, LogSeverity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogSeverity::Low => "low",
            LogSeverity::Medium => "medium",
            LogSeverity::High => "high",
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown log severity: {0}")]
pub struct ParseSeverityError(String);

impl FromStr for LogSeverity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(LogSeverity::Low),
            "medium" => Ok(LogSeverity::Medium),
            "high" => Ok(LogSeverity::High),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

/// Typed construction parameters for a `LogEntry`
#[derive(Debug, Clone)]
pub struct LogEntryOptions {
    pub message: String,
    pub level: LogSeverity,
    pub origin: String,
    /// Taken from the clock when absent
    pub created_at: Option<DateTime<Utc>>,
}

impl LogEntryOptions {
    pub fn new(message: impl Into<String>, level: LogSeverity, origin: impl Into<String>) -> Self {
        Self { message: message.into(), level, origin: origin.into(), created_at: None }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// One observed event.
///
/// Entries have no identity beyond their fields and are never mutated once built;
/// repositories receive them by reference and keep their own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    message: String,
    level: LogSeverity,
    origin: String,
    created_at: DateTime<Utc>,
}

/// Serialized shape of an entry as read back from storage.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogRecord {
    message: String,
    level: LogSeverity,
    origin: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl LogEntry {
    pub fn new(options: LogEntryOptions, clock: &dyn Clock) -> Self {
        Self {
            message: options.message,
            level: options.level,
            origin: options.origin,
            created_at: options.created_at.unwrap_or_else(|| clock.now()),
        }
    }

    /// Build an entry from an untyped mapping.
    ///
    /// A missing value, `null` or an empty object is reported as `Ok(None)`. An unknown
    /// level or a timestamp that is not RFC 3339 is a decode error.
    pub fn from_value(value: Option<Value>, clock: &dyn Clock) -> Result<Option<Self>, LogDecodeError> {
        let value = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(map)) if map.is_empty() => return Ok(None),
            Some(value) => value,
        };

        let record: LogRecord = serde_json::from_value(value)?;
        let mut options = LogEntryOptions::new(record.message, record.level, record.origin);
        options.created_at = record.created_at;

        Ok(Some(Self::new(options, clock)))
    }

    /// Same rules as [`LogEntry::from_value`], starting from JSON text. Blank text is absent.
    pub fn from_json(raw: &str, clock: &dyn Clock) -> Result<Option<Self>, LogDecodeError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(Some(value), clock)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn level(&self) -> LogSeverity {
        self.level
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:<6}] {}: {}",
            self.created_at.to_rfc3339(),
            self.level,
            self.origin,
            self.message
        )
    }
}
