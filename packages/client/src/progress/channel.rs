use super::{CancellationFlag, ProgressPacket};

/// Receives the `..._processed` progress callbacks.
///
/// In async mode these run on the thread that owns the exchange handle rather than on
/// the worker, so implementations may touch owner-thread state.
pub trait ProgressListener {
    /// Upload progress after a chunk has been written.
    fn on_byte_chunk_sent_processed(&mut self, _total_processed: u64, _total_length: Option<u64>) {}

    /// Download progress after a chunk has been handed to the consumer.
    fn on_byte_chunk_received_processed(
        &mut self,
        _total_processed: u64,
        _total_length: Option<u64>,
    ) {
    }
}

/// Ignores every progress callback.
impl ProgressListener for () {}

/// Delivery strategy for progress packets.
pub trait TransferSink {
    fn deliver(&self, listener: &mut dyn ProgressListener, packet: ProgressPacket);
}

/// Delivers packets inline to the listener on the executing thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectSink;

impl TransferSink for DirectSink {
    fn deliver(&self, listener: &mut dyn ProgressListener, packet: ProgressPacket) {
        dispatch(listener, packet);
    }
}

/// Route one packet to the matching listener callback.
pub fn dispatch(listener: &mut dyn ProgressListener, packet: ProgressPacket) {
    if packet.is_download {
        listener.on_byte_chunk_received_processed(packet.bytes_processed, packet.total_bytes);
    } else {
        listener.on_byte_chunk_sent_processed(packet.bytes_processed, packet.total_bytes);
    }
}

/// The single progress sink fed by both the upload and download loops of one exchange.
pub struct TransferChannel<'a> {
    cancellation: &'a CancellationFlag,
    sink: &'a dyn TransferSink,
}

impl<'a> TransferChannel<'a> {
    pub fn new(cancellation: &'a CancellationFlag, sink: &'a dyn TransferSink) -> Self {
        Self { cancellation, sink }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Forward a packet unless the exchange has been cancelled.
    pub fn transfer_progress(&self, listener: &mut dyn ProgressListener, packet: ProgressPacket) {
        if self.is_cancelled() {
            return;
        }
        self.sink.deliver(listener, packet);
    }
}
