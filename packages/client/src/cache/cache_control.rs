//! `Cache-Control` directive parsing.

use http::HeaderMap;
use http::header::{CACHE_CONTROL, PRAGMA};

/// The directives the cache acts on, from either a request or a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub no_store: bool,
    pub no_cache: bool,
    pub max_age: Option<u64>,
    pub must_revalidate: bool,
    pub only_if_cached: bool,
    pub public: bool,
}

impl CacheControl {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut control = CacheControl::default();

        for value in headers.get_all(CACHE_CONTROL) {
            let Ok(value) = value.to_str() else { continue };
            for directive in value.split(',') {
                let directive = directive.trim();
                let (name, argument) = match directive.split_once('=') {
                    Some((name, argument)) => (name.trim(), Some(argument.trim().trim_matches('"'))),
                    None => (directive, None),
                };
                match name.to_ascii_lowercase().as_str() {
                    "no-store" => control.no_store = true,
                    "no-cache" => control.no_cache = true,
                    "max-age" => control.max_age = argument.and_then(|a| a.parse().ok()),
                    "must-revalidate" => control.must_revalidate = true,
                    "only-if-cached" => control.only_if_cached = true,
                    "public" => control.public = true,
                    _ => {}
                }
            }
        }

        let pragma_no_cache = headers
            .get_all(PRAGMA)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.to_ascii_lowercase().contains("no-cache"));
        if pragma_no_cache && headers.get(CACHE_CONTROL).is_none() {
            control.no_cache = true;
        }

        control
    }
}
