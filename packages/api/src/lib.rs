//! # Courier
//!
//! Fluent facade over the `courier_client` exchange engine: clients bound to a base
//! URL, a request builder for headers, query parameters and entities, and the
//! consumer types that receive each response.
//!
//! ```no_run
//! use courier::{ResponseConsumer, StringConsumer, SyncHttpClient};
//!
//! # fn main() -> courier::Result<()> {
//! let client = SyncHttpClient::new("https://api.example.com/v1/")?;
//! let consumer = client
//!     .get("users")
//!     .query("page", "2")
//!     .header("X-Trace", "on")
//!     .send(StringConsumer::new())?;
//! println!("{} {:?}", consumer.connection_info().response_code, consumer.content());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod builder;
pub mod client;

pub use builder::{Background, Blocking, ContentType, Form, Part, RequestBuilder, resolve_url};
pub use client::{AsyncHttpClient, SyncHttpClient};

pub use courier_client::{
    BytesConsumer, CancellationFlag, ClientConfig, ClientStats, ConnectionInfo, DiskCache, Error,
    Exchange, FileConsumer, JsonConsumer, ProgressListener, ProgressPacket, RequestBody,
    RequestMethod, ResponseConsumer, Result, StringConsumer, TrustMode, Url, WorkerPool,
    default_user_agent,
};
