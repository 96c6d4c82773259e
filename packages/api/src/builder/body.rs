//! Request entity builders
//!
//! JSON, text, raw and gzip-wrapped bytes are held in memory and can be replayed
//! across 307/308 redirects. Reader bodies stream once.

use std::io::Read;

use bytes::Bytes;
use courier_client::RequestBody;
use courier_client::http::compression::gzip_bytes;
use http::header::{CONTENT_ENCODING, HeaderValue};
use serde::Serialize;

use super::core::{ContentType, RequestBuilder};

impl<D> RequestBuilder<D> {
    /// Set the request body as-is.
    #[must_use]
    pub fn body(self, body: impl Into<RequestBody>) -> Self {
        let body = body.into();
        self.map(|spec| spec.body(body))
    }

    /// Serialize `value` as the body, defaulting `Content-Type` to `application/json`.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        let encoded = serde_json::to_vec(value);
        self.try_map(|spec| {
            let encoded = encoded.map_err(courier_client::error::builder)?;
            log::debug!("courier: JSON body ({} bytes)", encoded.len());
            Ok(spec.body(RequestBody::bytes(encoded)))
        })
        .default_content_type(ContentType::ApplicationJson)
    }

    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        let body = RequestBody::text(text);
        self.map(|spec| spec.body(body))
            .default_content_type(ContentType::TextPlain)
    }

    #[must_use]
    pub fn bytes(self, data: impl Into<Bytes>) -> Self {
        let body = RequestBody::bytes(data);
        self.map(|spec| spec.body(body))
            .default_content_type(ContentType::ApplicationOctetStream)
    }

    /// Compress `data` and send it with `Content-Encoding: gzip`.
    ///
    /// `Content-Type` describes the uncompressed entity and is left to the caller.
    #[must_use]
    pub fn gzip(self, data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();
        let compressed = gzip_bytes(data);
        self.try_map(|spec| {
            let compressed = compressed.map_err(courier_client::error::body)?;
            log::debug!(
                "courier: gzip body ({} -> {} bytes)",
                data.len(),
                compressed.len()
            );
            Ok(spec
                .header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
                .body(RequestBody::bytes(compressed)))
        })
    }

    /// Stream the body from `reader`. Without a length it is sent chunked.
    #[must_use]
    pub fn reader<R: Read + Send + 'static>(self, reader: R, length: Option<u64>) -> Self {
        let body = RequestBody::reader(reader, length);
        self.map(|spec| spec.body(body))
    }
}
