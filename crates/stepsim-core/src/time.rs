//! Timestamp and label formatting shared by every writer.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Timelike, Utc};

/// Current UTC time as an RFC 3339 string with millisecond precision.
pub fn now_timestamp() -> String {
    timestamp_at(Utc::now())
}

pub fn timestamp_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Zero-padded `HH:MM` label for a local wall-clock instant.
pub fn history_label(at: NaiveDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}
