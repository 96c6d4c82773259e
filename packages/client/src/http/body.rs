//! Request body producers.

use std::fmt;
use std::io::{self, Cursor, Read};

use bytes::Bytes;

/// Body written after the request head.
///
/// In-memory bodies can be replayed when a 307/308 redirect is followed; reader bodies
/// are consumed by the first write.
pub enum RequestBody {
    Bytes(Bytes),
    Reader {
        reader: Box<dyn Read + Send>,
        /// Declared length, `None` sends the body chunked
        length: Option<u64>,
    },
}

impl RequestBody {
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        RequestBody::Bytes(data.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        RequestBody::Bytes(Bytes::from(text.into()))
    }

    pub fn reader<R: Read + Send + 'static>(reader: R, length: Option<u64>) -> Self {
        RequestBody::Reader {
            reader: Box::new(reader),
            length,
        }
    }

    /// Declared length in bytes, if known.
    #[must_use]
    pub fn length(&self) -> Option<u64> {
        match self {
            RequestBody::Bytes(bytes) => Some(bytes.len() as u64),
            RequestBody::Reader { length, .. } => *length,
        }
    }

    #[must_use]
    pub fn is_replayable(&self) -> bool {
        matches!(self, RequestBody::Bytes(_))
    }

    /// A second copy of an in-memory body.
    #[must_use]
    pub fn try_clone(&self) -> Option<RequestBody> {
        match self {
            RequestBody::Bytes(bytes) => Some(RequestBody::Bytes(bytes.clone())),
            RequestBody::Reader { .. } => None,
        }
    }

    pub(crate) fn into_reader(self) -> Box<dyn Read + Send> {
        match self {
            RequestBody::Bytes(bytes) => Box::new(Cursor::new(bytes)),
            RequestBody::Reader { reader, .. } => reader,
        }
    }

    /// Drain the whole body into memory.
    pub fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            RequestBody::Bytes(bytes) => Ok(bytes),
            RequestBody::Reader { mut reader, length } => {
                let capacity = length.and_then(|len| usize::try_from(len).ok()).unwrap_or(0);
                let mut buffer = Vec::with_capacity(capacity);
                reader.read_to_end(&mut buffer)?;
                Ok(Bytes::from(buffer))
            }
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            RequestBody::Reader { length, .. } => {
                f.debug_struct("Reader").field("length", length).finish()
            }
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Bytes(Bytes::from(text))
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Bytes(Bytes::from_static(text.as_bytes()))
    }
}
