use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::client::conn::http1::SendRequest;
use tokio::sync::mpsc;

use super::Transport;

/// Request body fed from the executing thread through a one-slot channel.
#[derive(Debug)]
pub struct OutboundBody {
    chunks: Option<mpsc::Receiver<Bytes>>,
    length: Option<u64>,
}

impl OutboundBody {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            chunks: None,
            length: Some(0),
        }
    }

    /// A streaming body plus the sender that feeds it.
    #[must_use]
    pub fn channel(length: Option<u64>) -> (mpsc::Sender<Bytes>, Self) {
        let (sender, receiver) = mpsc::channel(1);
        (
            sender,
            Self {
                chunks: Some(receiver),
                length,
            },
        )
    }
}

impl Body for OutboundBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.chunks.as_mut() {
            Some(chunks) => chunks
                .poll_recv(cx)
                .map(|chunk| chunk.map(|data| Ok(Frame::data(data)))),
            None => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.chunks.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        match (self.chunks.as_ref(), self.length) {
            (None, _) => SizeHint::with_exact(0),
            (Some(_), Some(length)) => SizeHint::with_exact(length),
            (Some(_), None) => SizeHint::default(),
        }
    }
}

/// Pulls hyper body frames on demand, blocking the calling thread for each one.
///
/// Reads past the end keep returning 0. A frame that does not arrive within the
/// timeout fails the read with `ErrorKind::TimedOut`.
pub struct BlockingBody<'t> {
    transport: &'t Transport,
    body: Incoming,
    chunk: Bytes,
    done: bool,
    // Keeps the connection's request side open until the body is dropped.
    _sender: SendRequest<OutboundBody>,
}

impl<'t> BlockingBody<'t> {
    pub(crate) fn new(
        transport: &'t Transport,
        body: Incoming,
        sender: SendRequest<OutboundBody>,
    ) -> Self {
        Self {
            transport,
            body,
            chunk: Bytes::new(),
            done: false,
            _sender: sender,
        }
    }
}

impl Read for BlockingBody<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if !self.chunk.is_empty() {
                let len = buf.len().min(self.chunk.len());
                buf[..len].copy_from_slice(&self.chunk[..len]);
                self.chunk.advance(len);
                return Ok(len);
            }
            if self.done || buf.is_empty() {
                return Ok(0);
            }

            let frame = self.transport.block_on_io(self.body.frame())?;
            match frame {
                None => self.done = true,
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        self.chunk = data;
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Err(io::Error::other(e));
                }
            }
        }
    }
}
