//! Stored response metadata with freshness and validation rules.

use std::time::Duration;

use http::header::{
    AGE, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, DATE, ETAG, EXPIRES, HeaderMap,
    HeaderName, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, VARY,
};
use serde::{Deserialize, Serialize};

use super::CacheControl;
use super::http_date::parse_http_date_millis;
use crate::http::RequestMethod;

/// Statuses a private cache may store without explicit freshness.
const CACHEABLE_BY_DEFAULT: [u16; 11] = [200, 203, 204, 300, 301, 308, 404, 405, 410, 414, 501];

/// Hop-by-hop headers never copied from a 304 into a stored entry.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Metadata persisted next to a cached body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub method: RequestMethod,
    pub status: u16,
    /// Response headers exactly as stored; the only headers a cache hit exposes
    pub headers: Vec<(String, String)>,
    /// Request header values named by `Vary` at storage time
    pub vary: Vec<(String, Option<String>)>,
    /// When the request that produced this entry was sent, epoch ms
    pub request_time: u64,
    /// When its response head arrived, epoch ms
    pub response_time: u64,
    /// File name of the body inside the cache directory
    pub body_file: String,
    pub body_length: u64,
}

impl CacheEntry {
    /// Metadata for a network response, or `None` when `Vary: *` makes it unstorable.
    #[must_use]
    pub fn from_response(
        url: &url::Url,
        method: RequestMethod,
        status: u16,
        response_headers: &HeaderMap,
        request_headers: &HeaderMap,
        request_time: u64,
        response_time: u64,
    ) -> Option<Self> {
        let vary = vary_fields(response_headers)?;
        let vary = vary
            .into_iter()
            .map(|name| {
                let value = request_headers
                    .get(name.as_str())
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                (name, value)
            })
            .collect();

        Some(Self {
            url: url.as_str().to_string(),
            method,
            status,
            headers: header_pairs(response_headers),
            vary,
            request_time,
            response_time,
            body_file: String::new(),
            body_length: 0,
        })
    }

    /// The stored response headers.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        headers
    }

    fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.as_str()))
            .map(|(_, v)| v.as_str())
    }

    fn control(&self) -> CacheControl {
        CacheControl::from_headers(&self.headers())
    }

    /// How long the entry stays fresh after it was generated.
    #[must_use]
    pub fn freshness_lifetime(&self) -> Option<Duration> {
        let control = self.control();
        if let Some(max_age) = control.max_age {
            return Some(Duration::from_secs(max_age));
        }

        let served = self
            .header(&DATE)
            .and_then(parse_http_date_millis)
            .unwrap_or(self.response_time);

        if let Some(expires) = self.header(&EXPIRES) {
            let expires = parse_http_date_millis(expires).unwrap_or(0);
            return Some(Duration::from_millis(expires.saturating_sub(served)));
        }

        let has_query = url::Url::parse(&self.url).is_ok_and(|url| url.query().is_some());
        if let Some(modified) = self.header(&LAST_MODIFIED).and_then(parse_http_date_millis) {
            if !has_query && modified <= served {
                return Some(Duration::from_millis((served - modified) / 10));
            }
        }

        None
    }

    /// Age of the entry at `now` (epoch ms), per RFC 7234 §4.2.3.
    #[must_use]
    pub fn current_age(&self, now: u64) -> Duration {
        let date = self
            .header(&DATE)
            .and_then(parse_http_date_millis)
            .unwrap_or(self.response_time);
        let apparent_age = self.response_time.saturating_sub(date);
        let age_header = self
            .header(&AGE)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(0, |secs| secs.saturating_mul(1000));
        let corrected_received = apparent_age.max(age_header);
        let response_delay = self.response_time.saturating_sub(self.request_time);
        let resident = now.saturating_sub(self.response_time);

        Duration::from_millis(
            corrected_received
                .saturating_add(response_delay)
                .saturating_add(resident),
        )
    }

    /// Whether the entry may be served at `now` without contacting the origin.
    #[must_use]
    pub fn is_fresh(&self, now: u64, request: &CacheControl) -> bool {
        if request.no_cache || self.control().no_cache {
            return false;
        }
        let Some(mut lifetime) = self.freshness_lifetime() else {
            return false;
        };
        if let Some(max_age) = request.max_age {
            lifetime = lifetime.min(Duration::from_secs(max_age));
        }
        self.current_age(now) < lifetime
    }

    /// Whether the request headers select this stored representation.
    #[must_use]
    pub fn matches_vary(&self, request_headers: &HeaderMap) -> bool {
        self.vary.iter().all(|(name, stored)| {
            let current = request_headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok());
            current == stored.as_deref()
        })
    }

    /// `If-None-Match` / `If-Modified-Since` for revalidation; empty when there are no
    /// validators.
    #[must_use]
    pub fn conditional_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = self.header(&ETAG).and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(IF_NONE_MATCH, value);
        }
        if let Some(value) = self
            .header(&LAST_MODIFIED)
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(IF_MODIFIED_SINCE, value);
        }
        headers
    }

    /// Fold a 304's end-to-end headers into the stored headers.
    ///
    /// Content framing headers keep their stored values.
    pub fn merge_not_modified(&mut self, not_modified: &HeaderMap, request_time: u64, response_time: u64) {
        let keeps_stored = |name: &str| {
            HOP_BY_HOP.contains(&name)
                || name == CONTENT_LENGTH.as_str()
                || name == CONTENT_ENCODING.as_str()
                || name == CONTENT_TYPE.as_str()
        };
        let replaced: Vec<&str> = not_modified
            .keys()
            .map(HeaderName::as_str)
            .filter(|name| !keeps_stored(name))
            .collect();

        self.headers
            .retain(|(name, _)| !replaced.iter().any(|r| r.eq_ignore_ascii_case(name)));
        for (name, value) in not_modified {
            if keeps_stored(name.as_str()) {
                continue;
            }
            if let Ok(value) = value.to_str() {
                self.headers.push((name.as_str().to_string(), value.to_string()));
            }
        }
        self.request_time = request_time;
        self.response_time = response_time;
    }
}

/// Whether a network response may be stored.
#[must_use]
pub fn is_cacheable(
    method: RequestMethod,
    status: u16,
    response_headers: &HeaderMap,
    request_headers: &HeaderMap,
) -> bool {
    if method != RequestMethod::Get {
        return false;
    }
    let response = CacheControl::from_headers(response_headers);
    let request = CacheControl::from_headers(request_headers);
    if response.no_store || request.no_store {
        return false;
    }
    if CACHEABLE_BY_DEFAULT.contains(&status) {
        return true;
    }
    if matches!(status, 302 | 307) {
        return response.max_age.is_some() || response.public || response_headers.contains_key(EXPIRES);
    }
    false
}

/// Lowercased `Vary` field names; `None` for `Vary: *`.
fn vary_fields(headers: &HeaderMap) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    for value in headers.get_all(VARY) {
        let Ok(value) = value.to_str() else { continue };
        for field in value.split(',') {
            let field = field.trim().to_ascii_lowercase();
            if field == "*" {
                return None;
            }
            if !field.is_empty() && !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    Some(fields)
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}
