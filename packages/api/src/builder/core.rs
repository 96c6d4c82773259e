//! Core `RequestBuilder` structure and dispatch targets
//!
//! A builder carries the request being composed, or the first error hit while
//! composing it, plus the driver it will be sent through. The driver type picks
//! which `send` is available.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use courier_client::{
    AsyncDriver, DiskCache, Exchange, RequestSpec, ResponseConsumer, Result, SyncDriver, TrustMode,
};

/// Content types set by the entity builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// application/json content type
    ApplicationJson,
    /// application/octet-stream content type
    ApplicationOctetStream,
    /// text/plain content type
    TextPlain,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::ApplicationJson => "application/json",
            ContentType::ApplicationOctetStream => "application/octet-stream",
            ContentType::TextPlain => "text/plain; charset=utf-8",
        }
    }
}

/// Sends on the calling thread; `send` returns the finished consumer.
#[derive(Debug, Clone)]
pub struct Blocking {
    pub(crate) driver: SyncDriver,
}

/// Sends on the client's worker pool; `send` returns an [`Exchange`] handle.
#[derive(Debug)]
pub struct Background<'a> {
    pub(crate) driver: &'a mut AsyncDriver,
}

/// Fluent request builder returned by the client verb methods.
///
/// Errors from header parsing or body serialization are held until `send`.
pub struct RequestBuilder<D> {
    pub(crate) target: D,
    pub(crate) request: Result<RequestSpec>,
}

impl<D> RequestBuilder<D> {
    pub(crate) fn new(target: D, request: Result<RequestSpec>) -> Self {
        Self { target, request }
    }

    pub(crate) fn map(mut self, f: impl FnOnce(RequestSpec) -> RequestSpec) -> Self {
        self.request = self.request.map(f);
        self
    }

    pub(crate) fn try_map(mut self, f: impl FnOnce(RequestSpec) -> Result<RequestSpec>) -> Self {
        self.request = self.request.and_then(f);
        self
    }

    /// Override the client timeout for this request. `Duration::ZERO` disables it.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|spec| spec.timeout(timeout))
    }

    #[must_use]
    pub fn follow_redirects(self, follow: bool) -> Self {
        self.map(|spec| spec.follow_redirects(follow))
    }

    #[must_use]
    pub fn max_redirects(self, max: usize) -> Self {
        self.map(|spec| spec.max_redirects(max))
    }

    /// Select certificate verification. [`TrustMode::TrustAll`] is insecure.
    #[must_use]
    pub fn trust_mode(self, trust_mode: TrustMode) -> Self {
        self.map(|spec| spec.trust_mode(trust_mode))
    }

    #[must_use]
    pub fn cache(self, cache: Arc<DiskCache>) -> Self {
        self.map(|spec| spec.cache(cache))
    }

    /// Bypass the client's disk cache for this request.
    #[must_use]
    pub fn no_cache(self) -> Self {
        self.map(RequestSpec::without_cache)
    }

    /// Finish composing without sending.
    pub fn build(self) -> Result<RequestSpec> {
        self.request
    }
}

impl RequestBuilder<Blocking> {
    /// Run the exchange on this thread and return the consumer once `on_finish` has run.
    ///
    /// # Errors
    ///
    /// Only composition errors; transport failures are reported through the consumer
    /// as response code 0.
    pub fn send<C: ResponseConsumer>(self, consumer: C) -> Result<C> {
        let spec = self.request?;
        log::debug!("courier: {} {}", spec.method, spec.url);
        Ok(self.target.driver.execute(spec, consumer))
    }
}

impl RequestBuilder<Background<'_>> {
    /// Submit the exchange to the worker pool, cancelling the client's previous one.
    ///
    /// # Errors
    ///
    /// Only composition errors.
    pub fn send<C>(self, consumer: C) -> Result<Exchange<C>>
    where
        C: ResponseConsumer + Send + 'static,
    {
        let spec = self.request?;
        log::debug!("courier: {} {} (background)", spec.method, spec.url);
        Ok(self.target.driver.execute(spec, consumer))
    }
}

impl<D> fmt::Debug for RequestBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("RequestBuilder");
        match &self.request {
            Ok(spec) => builder
                .field("method", &spec.method)
                .field("url", &spec.url.as_str())
                .field("headers", &spec.headers)
                .finish(),
            Err(err) => builder.field("error", err).finish(),
        }
    }
}
