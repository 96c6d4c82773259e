//! Response consumers
//!
//! A [`ResponseConsumer`] receives the lifecycle callbacks of one exchange and
//! materializes typed content from the response body. Whole-body accumulators
//! ([`StringConsumer`], [`BytesConsumer`]) parse once in `generate_content`; incremental
//! sinks ([`JsonConsumer`], [`FileConsumer`]) consume each chunk as it arrives.

pub mod bytes;
pub mod connection_info;
pub mod file;
pub mod handler;
pub mod json;
pub mod string;

pub use bytes::BytesConsumer;
pub use connection_info::ConnectionInfo;
pub use file::FileConsumer;
pub use handler::{ChunkReader, ResponseConsumer, receive_stream};
pub use json::JsonConsumer;
pub use string::StringConsumer;

use crate::progress::BUFFER_SIZE;

/// Initial accumulator capacity for a body of the advertised length.
pub(crate) fn initial_capacity(total_length: Option<u64>) -> usize {
    const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;
    total_length
        .and_then(|total| usize::try_from(total).ok())
        .map_or(BUFFER_SIZE, |total| total.clamp(BUFFER_SIZE, MAX_PREALLOCATION))
}
