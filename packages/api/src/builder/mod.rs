//! Fluent request composition
//!
//! Headers, entities, query parameters and per-request policy on top of the
//! client's configuration.

pub mod body;
pub mod core;
pub mod headers;
pub mod multipart;
pub mod url;

pub use core::{Background, Blocking, ContentType, RequestBuilder};
pub use multipart::{Form, Part};
pub use url::resolve_url;
