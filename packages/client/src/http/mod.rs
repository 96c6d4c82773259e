//! Request model and HTTP helpers
//!
//! The request value handed to the executor, its body producer, outbound header
//! composition and content-encoding handling.

pub mod body;
pub mod compression;
pub mod headers;
pub mod method;
pub mod request;

pub use body::RequestBody;
pub use method::RequestMethod;
pub use request::RequestSpec;
