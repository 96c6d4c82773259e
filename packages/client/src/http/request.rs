//! The resolved request handed to the executor.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use url::Url;

use super::{RequestBody, RequestMethod};
use crate::cache::DiskCache;
use crate::config::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT};
use crate::connect::TrustMode;

/// One fully resolved request plus the policy to apply to it.
///
/// Built per call, usually through [`ClientConfig::request`](crate::config::ClientConfig::request),
/// and consumed by the executor.
#[derive(Debug)]
pub struct RequestSpec {
    pub method: RequestMethod,
    pub url: Url,
    /// Caller headers, layered over the executor defaults
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    /// Zero disables the timeout
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: usize,
    pub trust_mode: TrustMode,
    pub use_native_certs: bool,
    /// Default `User-Agent` when `headers` has none
    pub user_agent: Option<String>,
    pub cache: Option<Arc<DiskCache>>,
}

impl RequestSpec {
    #[must_use]
    pub fn new(method: RequestMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            trust_mode: TrustMode::Default,
            use_native_certs: true,
            user_agent: None,
            cache: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a header parsed from strings.
    pub fn try_header(mut self, name: &str, value: &str) -> crate::Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(crate::error::builder)?;
        let value = HeaderValue::from_str(value).map_err(crate::error::builder)?;
        self.headers.append(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    #[must_use]
    pub fn trust_mode(mut self, trust_mode: TrustMode) -> Self {
        self.trust_mode = trust_mode;
        self
    }

    #[must_use]
    pub fn native_certs(mut self, enabled: bool) -> Self {
        self.use_native_certs = enabled;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<DiskCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }
}
