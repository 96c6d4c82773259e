use std::io::{self, Read};

use bytes::Bytes;

use crate::consumer::ResponseConsumer;
use crate::error;
use crate::http::RequestBody;
use crate::progress::{BUFFER_SIZE, ProgressPacket, TransferChannel};
use crate::transport::Hop;

pub(super) enum Upload {
    /// All bytes produced by the body were handed to the transport.
    Complete(u64),
    /// The peer stopped reading after this many bytes.
    Truncated(u64),
    Cancelled,
}

/// Stream `body` into the hop in fixed-size chunks.
///
/// With `report` set each chunk is announced through `on_byte_chunk_sent` and an
/// upload packet once the transport has accepted it.
pub(super) fn send_body<C: ResponseConsumer>(
    hop: &mut Hop<'_>,
    body: RequestBody,
    consumer: &mut C,
    channel: &TransferChannel<'_>,
    report: bool,
) -> crate::Result<Upload> {
    let total = body.length();
    let mut reader = body.into_reader();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut sent: u64 = 0;

    loop {
        if channel.is_cancelled() {
            return Ok(Upload::Cancelled);
        }
        let len = match reader.read(&mut buffer) {
            Ok(0) => return Ok(Upload::Complete(sent)),
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(error::body(e)),
        };

        if !hop.write_chunk(Bytes::copy_from_slice(&buffer[..len]))? {
            tracing::debug!(
                target: "courier::executor",
                sent,
                "Peer stopped reading the request body"
            );
            return Ok(Upload::Truncated(sent));
        }
        sent += len as u64;

        if report {
            consumer.on_byte_chunk_sent(&buffer[..len], len as u64, sent, total);
            channel.transfer_progress(consumer, ProgressPacket::upload(sent, total));
        }
    }
}
