use super::helpers::{RedirectLimit, TimedOut, WorkerLost};
use super::types::{Error, Kind};
use super::BoxError;

/// Creates an `Error` for a builder error.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for a request error.
pub fn request<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Request).with(e.into())
}

/// Creates an `Error` for a failed TCP connect.
pub fn connect<E: Into<BoxError>>(e: E, url: url::Url) -> Error {
    Error::new(Kind::Connect).with(e.into()).with_url(url)
}

/// Creates an `Error` for a TLS configuration or handshake failure.
pub fn tls<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Tls).with(e.into())
}

/// Creates an `Error` for an expired timeout.
pub fn timeout(url: url::Url) -> Error {
    Error::new(Kind::Timeout).with(TimedOut).with_url(url)
}

/// Creates an `Error` for a redirect error.
pub fn redirect<E: Into<BoxError>>(e: E, url: url::Url) -> Error {
    Error::new(Kind::Redirect).with(e.into()).with_url(url)
}

pub fn too_many_redirects(max: usize, url: url::Url) -> Error {
    redirect(RedirectLimit { max }, url)
}

/// Creates an `Error` for a body error.
pub fn body<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Body).with(e.into())
}

/// Creates an `Error` for a decode error.
pub fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode).with(e.into())
}

/// Creates an `Error` for a disk cache failure.
pub fn cache<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Cache).with(e.into())
}

pub fn worker_lost() -> Error {
    Error::new(Kind::WorkerLost).with(WorkerLost)
}
