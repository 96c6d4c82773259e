//! Blocking facade over hyper's HTTP/1.1 client connection.
//!
//! Each exchange gets its own current-thread runtime that only runs while the
//! executing thread is inside one of the calls below, so no background threads are
//! involved. Request bodies are pushed chunk by chunk; response bodies are pulled
//! through a `std::io::Read` adapter.

pub mod body;
pub mod session;

pub use body::{BlockingBody, OutboundBody};
pub use session::{Hop, ResponseHead, Transport};
