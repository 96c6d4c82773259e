//! Redirect Handling
//!
//! The executor follows 3xx responses hop by hop when the request allows it. Each
//! hop opens a fresh connection; [`RedirectPolicy`] bounds the chain and
//! [`plan_redirect`] decides the method, body and target of the next hop.

mod attempt;
mod headers;
mod policy;

pub use attempt::{Action, Attempt};
pub(crate) use headers::remove_sensitive_headers;
pub use policy::{NextHop, RedirectPolicy, is_redirect_status, plan_redirect};
