use http::HeaderMap;
use http::header::LOCATION;
use url::Url;

use super::attempt::{Action, Attempt};
use crate::config::DEFAULT_MAX_REDIRECTS;
use crate::http::RequestMethod;

/// Bounds a redirect chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    max_redirects: usize,
}

impl RedirectPolicy {
    /// Follow at most `max_redirects` hops.
    #[must_use]
    pub fn limited(max_redirects: usize) -> Self {
        Self { max_redirects }
    }

    /// Never follow redirects.
    #[must_use]
    pub fn none() -> Self {
        Self { max_redirects: 0 }
    }

    #[inline]
    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    pub fn check(&self, attempt: Attempt<'_>) -> Action {
        if self.max_redirects == 0 {
            Action::Stop
        } else if attempt.previous().len() > self.max_redirects {
            tracing::warn!(
                target: "courier::redirect",
                max = self.max_redirects,
                next = %attempt.url(),
                "Redirect limit exceeded"
            );
            Action::TooManyRedirects
        } else {
            Action::Follow
        }
    }
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self::limited(DEFAULT_MAX_REDIRECTS)
    }
}

/// Target, method and body disposition of the next hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextHop {
    pub url: Url,
    pub method: RequestMethod,
    /// Whether the request body is sent again.
    pub keep_body: bool,
}

#[inline]
pub fn is_redirect_status(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Work out the next hop for a redirect response, or `None` if it cannot be followed.
///
/// 303 always switches to `GET` (a `HEAD` stays `HEAD`). 301 and 302 switch any
/// method other than `GET`/`HEAD` to a body-less `GET`. 307 and 308 preserve method
/// and body, which requires a replayable body.
pub fn plan_redirect(
    status: u16,
    method: RequestMethod,
    current: &Url,
    headers: &HeaderMap,
    has_body: bool,
    body_replayable: bool,
) -> Option<NextHop> {
    if !is_redirect_status(status) {
        return None;
    }

    let location = headers.get(LOCATION)?.to_str().ok()?;
    let url = match current.join(location) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(
                target: "courier::redirect",
                location,
                error = %e,
                "Ignoring unparseable Location"
            );
            return None;
        }
    };
    if !matches!(url.scheme(), "http" | "https") {
        tracing::debug!(target: "courier::redirect", url = %url, "Ignoring redirect to unsupported scheme");
        return None;
    }

    let (method, keep_body) = match status {
        303 => match method {
            RequestMethod::Head => (RequestMethod::Head, false),
            _ => (RequestMethod::Get, false),
        },
        301 | 302 => match method {
            RequestMethod::Get | RequestMethod::Head => (method, false),
            _ => (RequestMethod::Get, false),
        },
        _ => {
            if has_body && !body_replayable {
                tracing::debug!(
                    target: "courier::redirect",
                    status,
                    "Body cannot be replayed; surfacing redirect"
                );
                return None;
            }
            (method, has_body)
        }
    };

    Some(NextHop {
        url,
        method,
        keep_body,
    })
}
