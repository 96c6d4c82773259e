use std::time::{SystemTime, UNIX_EPOCH};

use http::HeaderMap;
use serde::Serialize;
use url::Url;

use crate::http::RequestMethod;

/// Metadata describing one exchange.
///
/// Owned by the consumer, written only by the executor, and meant to be read after
/// `on_finish` has fired.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    pub connection_url: Option<Url>,
    pub request_method: Option<RequestMethod>,
    pub request_headers: HeaderMap,
    /// Exchange start, epoch milliseconds
    pub connection_time: Option<u64>,
    /// Declared request body length
    pub connection_length: Option<u64>,
    pub response_headers: HeaderMap,
    /// 0 until set; 0 after completion means a network or timeout failure
    pub response_code: u16,
    /// Bytes delivered to the consumer
    pub response_length: Option<u64>,
    /// Completion, epoch milliseconds
    pub response_time: Option<u64>,
    /// The response body came from the disk cache
    pub served_from_cache: bool,
}

impl ConnectionInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed milliseconds between start and completion, once both are stamped.
    #[must_use]
    pub fn elapsed_millis(&self) -> Option<u64> {
        match (self.connection_time, self.response_time) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        is_success_code(self.response_code)
    }

    /// Serializable view for logging or diagnostics.
    #[must_use]
    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            url: self.connection_url.as_ref().map(Url::to_string),
            method: self.request_method.map(RequestMethod::as_str),
            response_code: self.response_code,
            connection_length: self.connection_length,
            response_length: self.response_length,
            elapsed_millis: self.elapsed_millis(),
            served_from_cache: self.served_from_cache,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummary {
    pub url: Option<String>,
    pub method: Option<&'static str>,
    pub response_code: u16,
    pub connection_length: Option<u64>,
    pub response_length: Option<u64>,
    pub elapsed_millis: Option<u64>,
    pub served_from_cache: bool,
}

/// 1xx, 2xx and 3xx are success; everything else, including 0, is failure.
#[must_use]
pub fn is_success_code(code: u16) -> bool {
    (101..=399).contains(&code)
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_band_is_101_to_399() {
        assert!(!is_success_code(0));
        assert!(!is_success_code(100));
        assert!(is_success_code(101));
        assert!(is_success_code(200));
        assert!(is_success_code(304));
        assert!(is_success_code(399));
        assert!(!is_success_code(400));
        assert!(!is_success_code(503));
    }

    #[test]
    fn elapsed_requires_both_stamps() {
        let mut info = ConnectionInfo::new();
        info.connection_time = Some(1_000);
        assert_eq!(info.elapsed_millis(), None);
        info.response_time = Some(1_250);
        assert_eq!(info.elapsed_millis(), Some(250));
    }
}
