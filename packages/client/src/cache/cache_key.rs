//! Cache key generation and hashing for HTTP responses

use ring::digest::{SHA256, digest};
use url::Url;

use crate::http::RequestMethod;

/// Cache key for a response: method plus absolute URL without fragment.
///
/// Request headers that select between representations are handled through the
/// stored `Vary` snapshot rather than the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: RequestMethod,
    pub url: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(method: RequestMethod, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    /// Stable hex digest used as the on-disk file stem.
    #[must_use]
    pub fn hash_key(&self) -> String {
        let material = format!("{} {}", self.method.as_str(), self.url);
        hex::encode(digest(&SHA256, material.as_bytes()))
    }
}
