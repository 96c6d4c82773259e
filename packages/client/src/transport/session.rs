use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Request, Response};
use hyper::body::Incoming;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use url::{Position, Url};

use super::{BlockingBody, OutboundBody};
use crate::connect::{Connector, TrustMode};
use crate::error::{self, TimedOut};
use crate::http::RequestMethod;

type ResponseFuture = Pin<Box<dyn Future<Output = hyper::Result<Response<Incoming>>>>>;

/// Per-exchange runtime and timeout.
pub struct Transport {
    runtime: Runtime,
    timeout: Duration,
}

impl Transport {
    /// `Duration::ZERO` disables the timeout.
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(error::request)?;
        Ok(Self { runtime, timeout })
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn block_on_io<F: Future>(&self, future: F) -> io::Result<F::Output> {
        if self.timeout.is_zero() {
            return Ok(self.runtime.block_on(future));
        }
        // The timer has to be created inside the runtime.
        self.runtime
            .block_on(async { tokio::time::timeout(self.timeout, future).await })
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, TimedOut))
    }

    fn block_on_timed<F: Future>(&self, future: F, url: &Url) -> crate::Result<F::Output> {
        self.block_on_io(future)
            .map_err(|_| error::timeout(url.clone()))
    }

    /// Connect to `url`'s origin and start sending the request head.
    ///
    /// `body_length` is `None` when the request has no body, `Some(None)` when the
    /// body length is unknown.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &self,
        connector: &Connector,
        url: &Url,
        method: RequestMethod,
        headers: HeaderMap,
        body_length: Option<Option<u64>>,
        trust_mode: TrustMode,
        use_native_certs: bool,
    ) -> crate::Result<Hop<'_>> {
        let stream = self.block_on_timed(
            connector.connect(url, trust_mode, use_native_certs),
            url,
        )??;

        let (mut sender, conn) = self
            .block_on_timed(http1::handshake(TokioIo::new(stream)), url)?
            .map_err(|e| error::connect(e, url.clone()))?;
        self.runtime.spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(target: "courier::transport", error = %e, "Connection closed with error");
            }
        });

        let (chunks, body) = match body_length {
            None => (None, OutboundBody::empty()),
            Some(length) => {
                let (chunks, body) = OutboundBody::channel(length);
                (Some(chunks), body)
            }
        };

        let target = match &url[Position::BeforePath..] {
            "" => "/",
            target => target,
        };
        let mut request = Request::builder()
            .method(http::Method::from(method))
            .uri(target)
            .body(body)
            .map_err(|e| error::builder(e).with_url(url.clone()))?;
        *request.headers_mut() = headers;

        tracing::debug!(
            target: "courier::transport",
            method = %method,
            url = %url,
            "Sending request"
        );
        let response: ResponseFuture = Box::pin(sender.send_request(request));

        Ok(Hop {
            transport: self,
            url: url.clone(),
            chunks,
            response,
            sender,
        })
    }
}

/// One request/response on its own connection.
pub struct Hop<'t> {
    transport: &'t Transport,
    url: Url,
    chunks: Option<mpsc::Sender<Bytes>>,
    response: ResponseFuture,
    sender: SendRequest<OutboundBody>,
}

impl<'t> Hop<'t> {
    /// Push one body chunk. `Ok(false)` means the peer stopped reading the body.
    pub fn write_chunk(&mut self, chunk: Bytes) -> crate::Result<bool> {
        let Some(chunks) = self.chunks.as_ref() else {
            return Ok(false);
        };
        match self.transport.block_on_timed(chunks.send(chunk), &self.url)? {
            Ok(()) => Ok(true),
            Err(_) => {
                self.chunks = None;
                Ok(false)
            }
        }
    }

    /// End the request body and wait for the response head.
    pub fn response(mut self) -> crate::Result<ResponseHead<'t>> {
        self.chunks = None;
        let response = self
            .transport
            .block_on_timed(&mut self.response, &self.url)?
            .map_err(|e| error::request(e).with_url(self.url.clone()))?;

        let (parts, body) = response.into_parts();
        tracing::debug!(
            target: "courier::transport",
            url = %self.url,
            status = parts.status.as_u16(),
            "Received response head"
        );
        Ok(ResponseHead {
            status: parts.status.as_u16(),
            headers: parts.headers,
            body: BlockingBody::new(self.transport, body, self.sender),
        })
    }
}

/// Status line and headers of a response whose body has not been read yet.
pub struct ResponseHead<'t> {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: BlockingBody<'t>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_future_runs_on_a_plain_thread() {
        let transport = Transport::new(Duration::from_secs(5)).unwrap();
        let value = transport
            .block_on_io(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                7
            })
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn elapsed_timeout_is_reported_as_timed_out() {
        let transport = Transport::new(Duration::from_millis(50)).unwrap();
        let err = transport
            .block_on_io(async { tokio::time::sleep(Duration::from_secs(5)).await })
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(crate::error::classification::io_is_timeout(&err));
    }
}
