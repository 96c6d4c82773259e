use std::fmt;
use std::io::{self, BufReader, Read};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::{ChunkReader, ConnectionInfo, ResponseConsumer};
use crate::progress::{BUFFER_SIZE, ProgressListener, TransferChannel};

/// Deserializes the body as JSON while it streams.
///
/// The parser reads straight from the body; every chunk still passes through
/// `on_byte_chunk_received`. Defaults to an untyped [`serde_json::Value`].
pub struct JsonConsumer<T = serde_json::Value> {
    info: ConnectionInfo,
    parsed: Option<Result<T, serde_json::Error>>,
    content: Option<T>,
    _target: PhantomData<fn() -> T>,
}

impl<T> JsonConsumer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            info: ConnectionInfo::default(),
            parsed: None,
            content: None,
            _target: PhantomData,
        }
    }
}

impl<T> Default for JsonConsumer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonConsumer")
            .field("info", &self.info)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}

impl<T> ProgressListener for JsonConsumer<T> {}

impl<T: DeserializeOwned> ResponseConsumer for JsonConsumer<T> {
    type Content = T;

    fn connection_info(&self) -> &ConnectionInfo {
        &self.info
    }

    fn connection_info_mut(&mut self) -> &mut ConnectionInfo {
        &mut self.info
    }

    fn on_receive_stream(
        &mut self,
        stream: &mut dyn Read,
        channel: &TransferChannel<'_>,
        total_length: Option<u64>,
    ) -> io::Result<()> {
        let mut parsed = None;
        let reader = ChunkReader::new(self, stream, channel, total_length);
        let mut buffered = BufReader::with_capacity(BUFFER_SIZE, reader);
        let result = serde_json::from_reader::<_, T>(&mut buffered);
        let reader = buffered.into_inner();
        let empty = reader.read_count() == 0;
        match result {
            Ok(value) => parsed = Some(Ok(value)),
            Err(e) if e.is_io() => return Err(io::Error::from(e)),
            Err(e) if e.is_eof() && empty => {}
            Err(e) => parsed = Some(Err(e)),
        }
        reader.drain()?;
        self.parsed = parsed;
        Ok(())
    }

    fn generate_content(&mut self) -> crate::Result<()> {
        match self.parsed.take() {
            Some(Ok(value)) => {
                self.content = Some(value);
                Ok(())
            }
            Some(Err(e)) => Err(crate::error::decode(e)),
            None => Ok(()),
        }
    }

    fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }

    fn take_content(&mut self) -> Option<T> {
        self.content.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CancellationFlag, DirectSink};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        key: String,
    }

    fn run<T: DeserializeOwned>(body: &[u8]) -> (JsonConsumer<T>, crate::Result<()>) {
        let flag = CancellationFlag::new();
        let channel = TransferChannel::new(&flag, &DirectSink);
        let mut consumer = JsonConsumer::<T>::new();
        let mut stream = io::Cursor::new(body.to_vec());
        consumer
            .on_receive_stream(&mut stream, &channel, Some(body.len() as u64))
            .unwrap();
        let generated = consumer.generate_content();
        (consumer, generated)
    }

    #[test]
    fn typed_object_is_parsed() {
        let (consumer, generated) = run::<Pair>(b"{\"key\":\"value\"}\n");
        assert!(generated.is_ok());
        assert_eq!(consumer.content(), Some(&Pair { key: "value".into() }));
        assert_eq!(consumer.connection_info().response_length, Some(16));
    }

    #[test]
    fn malformed_body_reports_decode_error() {
        let (consumer, generated) = run::<serde_json::Value>(b"{\"key\":");
        assert!(generated.unwrap_err().is_decode());
        assert!(consumer.content().is_none());
        assert_eq!(consumer.connection_info().response_length, Some(7));
    }

    #[test]
    fn empty_body_has_no_content() {
        let (consumer, generated) = run::<serde_json::Value>(b"");
        assert!(generated.is_ok());
        assert!(consumer.content().is_none());
        assert_eq!(consumer.connection_info().response_length, Some(0));
    }
}
