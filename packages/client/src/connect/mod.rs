//! Connection establishment
//!
//! One fresh TCP connection per hop, optionally wrapped in TLS, handed to hyper
//! as a single [`MaybeTlsStream`].

pub mod connector;
pub mod stream;
pub mod tls;

pub use connector::Connector;
pub use stream::MaybeTlsStream;
pub use tls::{TlsConfigCache, TrustMode};
