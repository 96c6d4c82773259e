use bytes::Bytes;

use super::{ConnectionInfo, ResponseConsumer, initial_capacity};
use crate::progress::ProgressListener;

/// Accumulates the raw body.
///
/// An empty body yields no content.
#[derive(Debug, Default)]
pub struct BytesConsumer {
    info: ConnectionInfo,
    buffer: Option<Vec<u8>>,
    content: Option<Bytes>,
}

impl BytesConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressListener for BytesConsumer {}

impl ResponseConsumer for BytesConsumer {
    type Content = Bytes;

    fn connection_info(&self) -> &ConnectionInfo {
        &self.info
    }

    fn connection_info_mut(&mut self) -> &mut ConnectionInfo {
        &mut self.info
    }

    fn on_byte_chunk_received(
        &mut self,
        chunk: Option<&[u8]>,
        _chunk_length: u64,
        _total_processed: u64,
        total_length: Option<u64>,
    ) {
        if let Some(chunk) = chunk {
            self.buffer
                .get_or_insert_with(|| Vec::with_capacity(initial_capacity(total_length)))
                .extend_from_slice(chunk);
        }
    }

    fn generate_content(&mut self) -> crate::Result<()> {
        self.content = self
            .buffer
            .take()
            .filter(|buffer| !buffer.is_empty())
            .map(Bytes::from);
        Ok(())
    }

    fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    fn take_content(&mut self) -> Option<Bytes> {
        self.content.take()
    }
}
