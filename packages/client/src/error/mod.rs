//! Error type shared by the executor, policies and drivers.
//!
//! Errors never cross [`RequestExecutor::execute`](crate::executor::RequestExecutor::execute);
//! inside the executor they are logged and mapped to response code 0. They surface to callers
//! only from setup APIs such as [`DiskCache::open`](crate::cache::DiskCache::open) and
//! [`Exchange::wait`](crate::client::Exchange::wait).

pub mod classification;
pub mod constructors;
pub mod helpers;
pub mod types;

pub use constructors::*;
pub use helpers::{CacheError, RedirectLimit, TimedOut, TlsError, WorkerLost};
pub use types::{Error, Inner, Kind, Result};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
