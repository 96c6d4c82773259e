use super::{ConnectionInfo, ResponseConsumer, initial_capacity};
use crate::progress::ProgressListener;

/// Accumulates the body and decodes it as UTF-8 (lossy) once it is complete.
///
/// An empty body yields `Some(String::new())`.
#[derive(Debug, Default)]
pub struct StringConsumer {
    info: ConnectionInfo,
    buffer: Option<Vec<u8>>,
    content: Option<String>,
}

impl StringConsumer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressListener for StringConsumer {}

impl ResponseConsumer for StringConsumer {
    type Content = String;

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
        let buffer = self.buffer.take().unwrap_or_default();
        self.content = Some(match String::from_utf8(buffer) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        });
        Ok(())
    }

    fn content(&self) -> Option<&String> {
        self.content.as_ref()
    }

    fn take_content(&mut self) -> Option<String> {
        self.content.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_joined() {
        let mut consumer = StringConsumer::new();
        consumer.on_byte_chunk_received(Some(b"hel"), 3, 3, Some(5));
        consumer.on_byte_chunk_received(Some(b"lo"), 2, 5, Some(5));
        consumer.on_byte_chunk_received(None, 5, 5, Some(5));
        consumer.generate_content().unwrap();
        assert_eq!(consumer.content().map(String::as_str), Some("hello"));
        assert!(consumer.buffer.is_none());
    }

    #[test]
    fn empty_body_is_empty_string() {
        let mut consumer = StringConsumer::new();
        consumer.on_byte_chunk_received(None, 0, 0, Some(0));
        consumer.generate_content().unwrap();
        assert_eq!(consumer.into_content(), Some(String::new()));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut consumer = StringConsumer::new();
        consumer.on_byte_chunk_received(Some(&[b'a', 0xff, b'b']), 3, 3, None);
        consumer.generate_content().unwrap();
        assert_eq!(consumer.into_content().unwrap(), "a\u{fffd}b");
    }
}
