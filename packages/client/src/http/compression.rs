//! Gzip handling for response bodies and gzip-wrapped request entities.

use std::io::{self, BufRead, BufReader, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use http::HeaderMap;

use super::headers::is_gzip_encoded;

/// Wrap a response body in a gzip decoder when its `Content-Encoding` says so.
///
/// An empty body (HEAD, 204, 304) is passed through as is even when marked gzip.
/// Returns the stream to hand to the consumer and whether it was wrapped.
pub(crate) fn decode_response_body<'a, R: Read + 'a>(
    body: R,
    headers: &HeaderMap,
) -> io::Result<(Box<dyn Read + 'a>, bool)> {
    if !is_gzip_encoded(headers) {
        return Ok((Box::new(body), false));
    }
    let mut body = BufReader::new(body);
    if body.fill_buf()?.is_empty() {
        return Ok((Box::new(body), false));
    }
    Ok((Box::new(GzDecoder::new(body)), true))
}

/// Gzip-compress `data` at the default level.
pub fn gzip_bytes(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
