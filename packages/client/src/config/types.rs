//! Client configuration value.
//!
//! Replaces process-wide mutable client state: every driver is constructed from an
//! explicit `ClientConfig`, and every request inherits its policy from it.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};

use crate::cache::DiskCache;
use crate::connect::TrustMode;
use crate::http::{RequestMethod, RequestSpec};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Default `User-Agent`, sent unless a request supplies its own
    pub user_agent: String,

    /// Timeout applied to connect, write, response head and each body read.
    /// `Duration::ZERO` disables it.
    pub timeout: Duration,

    /// Follow 3xx responses transparently
    pub allow_redirects: bool,

    /// Maximum follow-up hops when redirects are followed
    pub max_redirects: usize,

    /// Certificate verification policy
    pub trust_mode: TrustMode,

    /// Load platform root certificates in addition to the bundled roots
    pub use_native_certs: bool,

    /// Headers added to every request before caller headers are applied
    pub default_headers: HeaderMap,

    /// Shared disk cache, if any
    pub cache: Option<Arc<DiskCache>>,
}

impl ClientConfig {
    /// Configuration with defaults; see the `Default` impl.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = allow;
        self
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Select certificate verification. [`TrustMode::TrustAll`] is insecure.
    #[must_use]
    pub fn with_trust_mode(mut self, trust_mode: TrustMode) -> Self {
        self.trust_mode = trust_mode;
        self
    }

    #[must_use]
    pub fn with_native_certs(mut self, enabled: bool) -> Self {
        self.use_native_certs = enabled;
        self
    }

    #[must_use]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DiskCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Start a request that inherits this configuration's policy.
    ///
    /// The default headers are copied into the request; caller headers added to the
    /// returned spec override them by name.
    #[must_use]
    pub fn request(&self, method: RequestMethod, url: url::Url) -> RequestSpec {
        let mut spec = RequestSpec::new(method, url)
            .timeout(self.timeout)
            .follow_redirects(self.allow_redirects)
            .max_redirects(self.max_redirects)
            .trust_mode(self.trust_mode)
            .native_certs(self.use_native_certs)
            .user_agent(self.user_agent.clone());
        spec.headers.extend(self.default_headers.clone());
        if let Some(cache) = &self.cache {
            spec = spec.cache(Arc::clone(cache));
        }
        spec
    }
}
