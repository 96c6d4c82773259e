use std::io::{self, Read};

use super::ConnectionInfo;
use crate::progress::{BUFFER_SIZE, ProgressListener, ProgressPacket, TransferChannel};

/// Receives the lifecycle of one exchange and produces typed content.
///
/// Callback order is fixed:
///
/// ```text
/// on_send
///   (on_byte_chunk_sent + on_byte_chunk_sent_processed)*
///   (on_byte_chunk_received + on_byte_chunk_received_processed)*
///   on_byte_chunk_received(None, ..)        end of body
/// generate_content
/// before_success + on_success | on_failure
/// before_finish + on_finish
/// ```
///
/// A transport failure skips straight from `on_send` to `on_failure`. Cancellation
/// suppresses everything after the chunk where it is observed except the finish pair.
pub trait ResponseConsumer: ProgressListener {
    type Content;

    fn connection_info(&self) -> &ConnectionInfo;

    fn connection_info_mut(&mut self) -> &mut ConnectionInfo;

    /// The request is about to be sent. Called once, before any I/O.
    fn on_send(&mut self) {}

    /// A request body chunk has been handed to the transport.
    fn on_byte_chunk_sent(
        &mut self,
        _chunk: &[u8],
        _chunk_length: u64,
        _total_processed: u64,
        _total_length: Option<u64>,
    ) {
    }

    /// Read the response body. The default reads in 8 KiB chunks and reports each
    /// one through [`on_byte_chunk_received`](Self::on_byte_chunk_received).
    fn on_receive_stream(
        &mut self,
        stream: &mut dyn Read,
        channel: &TransferChannel<'_>,
        total_length: Option<u64>,
    ) -> io::Result<()>
    where
        Self: Sized,
    {
        receive_stream(self, stream, channel, total_length)
    }

    /// One body chunk, or `None` once the body is drained; the terminal call carries
    /// the final byte count as both `chunk_length` and `total_processed`.
    fn on_byte_chunk_received(
        &mut self,
        _chunk: Option<&[u8]>,
        _chunk_length: u64,
        _total_processed: u64,
        _total_length: Option<u64>,
    ) {
    }

    /// Produce the final content from whatever was received.
    fn generate_content(&mut self) -> crate::Result<()>;

    fn content(&self) -> Option<&Self::Content>;

    fn take_content(&mut self) -> Option<Self::Content>;

    fn into_content(mut self) -> Option<Self::Content>
    where
        Self: Sized,
    {
        self.take_content()
    }

    fn before_success(&mut self) {}

    fn on_success(&mut self) {}

    fn on_failure(&mut self) {}

    fn before_finish(&mut self) {}

    fn on_finish(&mut self) {}
}

/// The default body read loop.
pub fn receive_stream<C: ResponseConsumer>(
    consumer: &mut C,
    stream: &mut dyn Read,
    channel: &TransferChannel<'_>,
    total_length: Option<u64>,
) -> io::Result<()> {
    ChunkReader::new(consumer, stream, channel, total_length).drain()
}

/// A `Read` adapter that reports every chunk it yields to the consumer.
///
/// Incremental consumers wrap the body in one of these and hand it to their parser,
/// then call [`drain`](Self::drain) to consume any remainder and emit the terminal
/// callback. A cancelled exchange reads as EOF and never emits the terminal callback.
pub struct ChunkReader<'s, 'c, C: ResponseConsumer> {
    consumer: &'s mut C,
    stream: &'s mut dyn Read,
    channel: &'s TransferChannel<'c>,
    total_length: Option<u64>,
    read_count: u64,
    cancelled: bool,
}

impl<'s, 'c, C: ResponseConsumer> ChunkReader<'s, 'c, C> {
    pub fn new(
        consumer: &'s mut C,
        stream: &'s mut dyn Read,
        channel: &'s TransferChannel<'c>,
        total_length: Option<u64>,
    ) -> Self {
        Self {
            consumer,
            stream,
            channel,
            total_length,
            read_count: 0,
            cancelled: false,
        }
    }

    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// Read to EOF, then report completion.
    pub fn drain(mut self) -> io::Result<()> {
        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            match self.read(&mut buffer) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.complete();
        Ok(())
    }

    fn complete(self) {
        if self.cancelled || self.channel.is_cancelled() {
            return;
        }
        let total = self.read_count;
        self.consumer.connection_info_mut().response_length = Some(total);
        self.consumer
            .on_byte_chunk_received(None, total, total, Some(total));
        self.channel
            .transfer_progress(&mut *self.consumer, ProgressPacket::download(total, Some(total)));
    }
}

impl<C: ResponseConsumer> Read for ChunkReader<'_, '_, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancelled || self.channel.is_cancelled() {
            self.cancelled = true;
            return Ok(0);
        }
        let limit = buf.len().min(BUFFER_SIZE);
        let len = self.stream.read(&mut buf[..limit])?;
        if len > 0 {
            self.read_count += len as u64;
            self.consumer.on_byte_chunk_received(
                Some(&buf[..len]),
                len as u64,
                self.read_count,
                self.total_length,
            );
            self.channel.transfer_progress(
                &mut *self.consumer,
                ProgressPacket::download(self.read_count, self.total_length),
            );
        }
        Ok(len)
    }
}
