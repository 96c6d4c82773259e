use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The seven request verbs the executor issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl RequestMethod {
    /// Canonical uppercase method string used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Head => "HEAD",
            RequestMethod::Options => "OPTIONS",
        }
    }

    /// Methods whose request may carry an entity body.
    #[must_use]
    pub const fn permits_body(self) -> bool {
        matches!(
            self,
            RequestMethod::Post | RequestMethod::Put | RequestMethod::Patch | RequestMethod::Delete
        )
    }

    /// Methods that invalidate a cached entry for the same URL.
    #[must_use]
    pub const fn invalidates_cache(self) -> bool {
        self.permits_body()
    }

    /// Methods whose responses the disk cache stores and serves.
    #[must_use]
    pub const fn is_cacheable(self) -> bool {
        matches!(self, RequestMethod::Get)
    }
}

impl From<RequestMethod> for http::Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => http::Method::GET,
            RequestMethod::Post => http::Method::POST,
            RequestMethod::Put => http::Method::PUT,
            RequestMethod::Patch => http::Method::PATCH,
            RequestMethod::Delete => http::Method::DELETE,
            RequestMethod::Head => http::Method::HEAD,
            RequestMethod::Options => http::Method::OPTIONS,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported request method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for RequestMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "PATCH" => Ok(RequestMethod::Patch),
            "DELETE" => Ok(RequestMethod::Delete),
            "HEAD" => Ok(RequestMethod::Head),
            "OPTIONS" => Ok(RequestMethod::Options),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}
