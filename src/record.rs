use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::mask::mask_context;

/// Level used when a caller passes an empty level string.
pub const DEFAULT_LEVEL: &str = "LOG";

/// Timestamp format of the first element of every log line.
pub const LINE_TIMESTAMP_FORMAT: &str = "UTC %Y-%m-%d %H:%M:%S%.6f";

/// Key/value context attached to a record.
pub type Context = BTreeMap<String, Value>;

/// A single log call, captured at the moment `log` was invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: Value,
    pub context: Context,
}

impl LogRecord {
    /// Capture a record stamped with the current time.
    ///
    /// `level` is trimmed and upper-cased; an empty level becomes
    /// [`DEFAULT_LEVEL`].
    pub fn new(level: &str, message: impl Into<Value>, context: Context) -> Self {
        Self::at(Utc::now(), level, message, context)
    }

    /// Same as [`LogRecord::new`] with an explicit timestamp.
    pub fn at(
        timestamp: DateTime<Utc>,
        level: &str,
        message: impl Into<Value>,
        context: Context,
    ) -> Self {
        Self {
            timestamp,
            level: normalize_level(level),
            message: message.into(),
            context,
        }
    }

    /// Build the serializable line form with sensitive context keys masked.
    pub fn entry(&self, masked_keys: &[String]) -> LogEntry {
        LogEntry(
            self.timestamp.format(LINE_TIMESTAMP_FORMAT).to_string(),
            self.level.clone(),
            self.message.clone(),
            mask_context(&self.context, masked_keys),
        )
    }
}

/// Compact positional form of a record: `[timestamp, level, message, context]`.
///
/// Serializes as a JSON array rather than an object to keep lines short.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LogEntry(pub String, pub String, pub Value, pub Context);

impl LogEntry {
    pub fn to_json(&self) -> String {
        // A tuple of strings, JSON values and a string-keyed map cannot fail
        // to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Upper-case a free-form level, defaulting to [`DEFAULT_LEVEL`].
pub fn normalize_level(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        DEFAULT_LEVEL.to_string()
    } else {
        level.to_uppercase()
    }
}
