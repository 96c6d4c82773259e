//! HTTP date parsing and formatting utilities
//!
//! RFC 7231 §7.1.1.1 formats: IMF-fixdate, RFC 850 and asctime.

use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDateTime, Utc};

/// HTTP date parsing error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpDateParseError {
    /// Date format was not recognized by any of the supported parsers
    #[error("Unrecognized HTTP date format: {0}")]
    UnrecognizedFormat(String),
    /// Date was parsed but represents a time before Unix epoch
    #[error("Invalid timestamp in HTTP date: {0}")]
    InvalidTimestamp(String),
}

/// Parse an HTTP date into `SystemTime`.
pub fn parse_http_date(date_str: &str) -> Result<SystemTime, HttpDateParseError> {
    let date_str = date_str.trim();

    let timestamp = NaiveDateTime::parse_from_str(date_str, "%a, %d %b %Y %H:%M:%S GMT")
        .map(|dt| dt.and_utc().timestamp())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(date_str, "%A, %d-%b-%y %H:%M:%S GMT")
                .map(|dt| dt.and_utc().timestamp())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(date_str, "%a %b %e %H:%M:%S %Y")
                .map(|dt| dt.and_utc().timestamp())
        })
        .or_else(|_| DateTime::parse_from_rfc2822(date_str).map(|dt| dt.timestamp()))
        .map_err(|_| HttpDateParseError::UnrecognizedFormat(date_str.to_string()))?;

    u64::try_from(timestamp)
        .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .map_err(|_| HttpDateParseError::InvalidTimestamp(date_str.to_string()))
}

/// Epoch milliseconds of an HTTP date, if it parses.
pub fn parse_http_date_millis(date_str: &str) -> Option<u64> {
    parse_http_date(date_str)
        .ok()
        .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
        .and_then(|elapsed| u64::try_from(elapsed.as_millis()).ok())
}

/// Format `SystemTime` as an IMF-fixdate string.
pub fn fmt_http_date(time: SystemTime) -> String {
    let duration = time
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    let dt = DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default();

    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
