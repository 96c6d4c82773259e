//! Attempt and Action types for redirect handling

use url::Url;

/// The next URL in a redirect chain plus the URLs already requested.
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    pub(crate) status: u16,
    pub(crate) next: &'a Url,
    pub(crate) previous: &'a [Url],
}

/// What to do with a redirect response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Request the next URL.
    Follow,
    /// Surface the 3xx response to the consumer.
    Stop,
    /// The chain exceeded the hop limit.
    TooManyRedirects,
}

impl<'a> Attempt<'a> {
    pub fn new(status: u16, next: &'a Url, previous: &'a [Url]) -> Self {
        Self {
            status,
            next,
            previous,
        }
    }

    /// Get the redirect status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the next URL to redirect to.
    pub fn url(&self) -> &Url {
        self.next
    }

    /// Get the list of previous URLs that have already been requested in this chain.
    pub fn previous(&self) -> &[Url] {
        self.previous
    }
}
