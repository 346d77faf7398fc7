//! Time utility functions

use chrono::{DateTime, Utc};

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to DateTime<Utc>
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(|| {
        tracing::warn!(millis, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert epoch milliseconds to ISO 8601 string (millisecond precision)
pub fn millis_to_iso(millis: i64) -> String {
    millis_to_datetime(millis).to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Format epoch milliseconds as a `YYYY-MM-DD` day key (UTC)
pub fn millis_to_day(millis: i64) -> String {
    millis_to_datetime(millis).format("%Y-%m-%d").to_string()
}

/// Parse ISO 8601 / RFC 3339 timestamp string to epoch milliseconds
pub fn parse_iso_millis(ts: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
        .ok()
}
