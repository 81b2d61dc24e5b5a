//! Telemetry event model, matching the ingestion endpoint's batch format

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Event type for successful but slow calls
pub const KIND_SLOW: &str = "slow";
/// Event type for terminal request failures
pub const KIND_FAILURE: &str = "failure";

/// Severity of a telemetry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        })
    }
}

/// A single diagnostic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: Uuid,
    #[serde(serialize_with = "serialize_ts")]
    pub ts: DateTime<Utc>,
    pub level: Level,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl TelemetryEvent {
    /// Creates an event stamped with a fresh id and the current time
    pub fn new(level: Level, source: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ts: Utc::now(),
            level,
            source: source.into(),
            kind: kind.into(),
            message: None,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// `warn`/`slow` event for a call that succeeded after `elapsed`
    pub fn slow(source: &str, context: &str, elapsed: Duration) -> Self {
        Self::new(Level::Warn, source, KIND_SLOW)
            .with_meta("ctx", context)
            .with_meta("ms", format!("{:.0}", elapsed.as_secs_f64() * 1000.0))
    }

    /// `error`/`failure` event for a call that failed terminally
    pub fn failure(source: &str, context: &str, error: &dyn std::error::Error) -> Self {
        Self::new(Level::Error, source, KIND_FAILURE)
            .with_message(error.to_string())
            .with_meta("ctx", context)
    }
}

fn serialize_ts<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
