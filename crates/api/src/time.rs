use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// ISO-8601 timestamp exactly as the archive server serializes it.
///
/// Ordering compares the raw strings. The server always emits UTC `Z` strings with a
/// fixed width, so lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the raw string; `None` for anything that is not RFC 3339.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }

    pub fn millis(&self) -> Option<i64> {
        self.to_datetime().map(|parsed| parsed.timestamp_millis())
    }

    /// Absolute distance in milliseconds, when both sides parse.
    pub fn distance_millis(&self, other: &Timestamp) -> Option<i64> {
        Some((self.millis()? - other.millis()?).abs())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
