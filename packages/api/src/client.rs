//! Clients bound to a base URL and a configuration.

use std::sync::Arc;

use courier_client::{
    AsyncDriver, ClientConfig, RequestExecutor, RequestMethod, Result, SyncDriver, WorkerPool,
};
use url::Url;

use crate::builder::core::{Background, Blocking, RequestBuilder};
use crate::builder::url::{as_directory, resolve_url};

fn parse_base(base: &str) -> Result<Url> {
    Url::parse(base)
        .map(as_directory)
        .map_err(courier_client::error::builder)
}

/// Blocking client: `send` runs the exchange on the calling thread.
#[derive(Debug, Clone)]
pub struct SyncHttpClient {
    base: Url,
    config: ClientConfig,
    driver: SyncDriver,
}

impl SyncHttpClient {
    /// # Errors
    ///
    /// Returns a builder error when `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self> {
        Self::with_config(base, ClientConfig::default())
    }

    /// # Errors
    ///
    /// Returns a builder error when `base` is not an absolute URL.
    pub fn with_config(base: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self::with_driver(parse_base(base)?, config, SyncDriver::new()))
    }

    #[must_use]
    pub fn with_driver(base: Url, config: ClientConfig, driver: SyncDriver) -> Self {
        Self {
            base: as_directory(base),
            config,
            driver,
        }
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a request for `path`, resolved against the base URL.
    pub fn request(&self, method: RequestMethod, path: &str) -> RequestBuilder<Blocking> {
        let spec = resolve_url::<&str, &str>(&self.base, path, &[])
            .map(|url| self.config.request(method, url));
        RequestBuilder::new(
            Blocking {
                driver: self.driver.clone(),
            },
            spec,
        )
    }

    pub fn get(&self, path: &str) -> RequestBuilder<Blocking> {
        self.request(RequestMethod::Get, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder<Blocking> {
        self.request(RequestMethod::Post, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder<Blocking> {
        self.request(RequestMethod::Put, path)
    }

    pub fn patch(&self, path: &str) -> RequestBuilder<Blocking> {
        self.request(RequestMethod::Patch, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder<Blocking> {
        self.request(RequestMethod::Delete, path)
    }

    pub fn head(&self, path: &str) -> RequestBuilder<Blocking> {
        self.request(RequestMethod::Head, path)
    }

    pub fn options(&self, path: &str) -> RequestBuilder<Blocking> {
        self.request(RequestMethod::Options, path)
    }
}

/// Background client: `send` runs the exchange on a worker thread.
///
/// At most one exchange is in flight per client; sending again cancels the
/// previous one.
#[derive(Debug)]
pub struct AsyncHttpClient {
    base: Url,
    config: ClientConfig,
    driver: AsyncDriver,
}

impl AsyncHttpClient {
    /// Client with its own two-thread worker pool.
    ///
    /// # Errors
    ///
    /// Fails when `base` is not an absolute URL or the pool cannot start.
    pub fn new(base: &str) -> Result<Self> {
        Self::with_config(base, ClientConfig::default())
    }

    /// # Errors
    ///
    /// Fails when `base` is not an absolute URL or the pool cannot start.
    pub fn with_config(base: &str, config: ClientConfig) -> Result<Self> {
        let base = parse_base(base)?;
        Ok(Self::with_driver(base, config, AsyncDriver::new()?))
    }

    /// Client running on a pool shared with other clients.
    ///
    /// # Errors
    ///
    /// Returns a builder error when `base` is not an absolute URL.
    pub fn with_pool(base: &str, config: ClientConfig, pool: Arc<WorkerPool>) -> Result<Self> {
        let driver = AsyncDriver::with_pool(Arc::new(RequestExecutor::new()), pool);
        Ok(Self::with_driver(parse_base(base)?, config, driver))
    }

    #[must_use]
    pub fn with_driver(base: Url, config: ClientConfig, driver: AsyncDriver) -> Self {
        Self {
            base: as_directory(base),
            config,
            driver,
        }
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a request for `path`, resolved against the base URL.
    pub fn request(&mut self, method: RequestMethod, path: &str) -> RequestBuilder<Background<'_>> {
        let spec = resolve_url::<&str, &str>(&self.base, path, &[])
            .map(|url| self.config.request(method, url));
        RequestBuilder::new(
            Background {
                driver: &mut self.driver,
            },
            spec,
        )
    }

    pub fn get(&mut self, path: &str) -> RequestBuilder<Background<'_>> {
        self.request(RequestMethod::Get, path)
    }

    pub fn post(&mut self, path: &str) -> RequestBuilder<Background<'_>> {
        self.request(RequestMethod::Post, path)
    }

    pub fn put(&mut self, path: &str) -> RequestBuilder<Background<'_>> {
        self.request(RequestMethod::Put, path)
    }

    pub fn patch(&mut self, path: &str) -> RequestBuilder<Background<'_>> {
        self.request(RequestMethod::Patch, path)
    }

    pub fn delete(&mut self, path: &str) -> RequestBuilder<Background<'_>> {
        self.request(RequestMethod::Delete, path)
    }

    pub fn head(&mut self, path: &str) -> RequestBuilder<Background<'_>> {
        self.request(RequestMethod::Head, path)
    }

    pub fn options(&mut self, path: &str) -> RequestBuilder<Background<'_>> {
        self.request(RequestMethod::Options, path)
    }

    /// Cancel the exchange in flight, if any.
    pub fn cancel(&mut self) {
        self.driver.cancel();
    }
}
