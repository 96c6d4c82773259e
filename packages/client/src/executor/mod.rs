//! Request execution
//!
//! [`RequestExecutor`] runs one exchange on the calling thread: consumer setup, cache
//! consultation, connect, upload, redirects, response delivery and the completion
//! callbacks. Drivers decide which thread that is and where progress goes.

mod core;
mod dispatch;
mod response;
mod upload;

pub use self::core::RequestExecutor;
pub use response::ResponseBody;
