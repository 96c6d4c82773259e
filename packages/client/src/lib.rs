//! # Courier HTTP exchange engine
//!
//! One core executor drives a single HTTP/1.1 exchange end to end and reports it to a
//! pluggable [`ResponseConsumer`] through a fixed callback lifecycle, with byte-level
//! progress and cooperative cancellation.
//!
//! ## Features
//!
//! - **Sync and async drivers** over the same [`RequestExecutor`]
//! - **Streaming upload and download** in 8 KiB chunks with [`ProgressPacket`]s
//! - **Rustls TLS** with a default and an explicit trust-all mode
//! - **Transparent gzip** response decoding
//! - **Redirect following** with method rewriting and credential stripping
//! - **Shared disk cache** with freshness, revalidation and LRU eviction
//!
//! ## Usage
//!
//! ```no_run
//! use courier_client::{RequestMethod, RequestSpec, ResponseConsumer, StringConsumer, SyncDriver};
//!
//! let url = url::Url::parse("http://example.com/").unwrap();
//! let consumer = SyncDriver::new().execute(
//!     RequestSpec::new(RequestMethod::Get, url),
//!     StringConsumer::new(),
//! );
//! println!("{} {:?}", consumer.connection_info().response_code, consumer.content());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod cache;
pub mod client;
pub mod config;
pub mod connect;
pub mod consumer;
pub mod error;
pub mod executor;
pub mod http;
pub mod progress;
pub mod redirect;
pub mod telemetry;
pub mod transport;

pub use cache::{CacheStats, DiskCache};
pub use client::{AsyncDriver, Exchange, SyncDriver, WorkerPool};
pub use config::{ClientConfig, default_user_agent};
pub use connect::TrustMode;
pub use consumer::{
    BytesConsumer, ConnectionInfo, FileConsumer, JsonConsumer, ResponseConsumer, StringConsumer,
};
pub use error::{Error, Result};
pub use executor::RequestExecutor;
pub use http::{RequestBody, RequestMethod, RequestSpec};
pub use progress::{CancellationFlag, ProgressListener, ProgressPacket};
pub use telemetry::{ClientStats, ClientStatsSnapshot};
pub use url::Url;
