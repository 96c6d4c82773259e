//! Outbound header composition and response header inspection.

use http::header::{
    ACCEPT_ENCODING, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, HOST, HeaderMap, HeaderValue,
    TRANSFER_ENCODING, USER_AGENT,
};
use url::Url;

/// Compose the header block actually sent for one hop.
///
/// Defaults first, caller headers replace them by name, then `Connection: close` and
/// framing headers are forced.
pub(crate) fn outbound_headers(
    url: &Url,
    caller: &HeaderMap,
    user_agent: Option<&str>,
    body_length: Option<Option<u64>>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(host) = host_header(url) {
        headers.insert(HOST, host);
    }
    if let Some(agent) = user_agent.and_then(|ua| HeaderValue::from_str(ua).ok()) {
        headers.insert(USER_AGENT, agent);
    }
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    for name in caller.keys() {
        headers.remove(name);
    }
    for (name, value) in caller {
        headers.append(name.clone(), value.clone());
    }

    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers.remove(TRANSFER_ENCODING);
    match body_length {
        Some(Some(length)) => {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
        Some(None) => {
            headers.remove(CONTENT_LENGTH);
            headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        }
        None => {
            headers.remove(CONTENT_LENGTH);
        }
    }

    headers
}

fn host_header(url: &Url) -> Option<HeaderValue> {
    let host = url.host_str()?;
    let value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).ok()
}

/// True when any `Content-Encoding` token is `gzip` (case-insensitive).
#[must_use]
pub fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| {
            let token = token.trim();
            token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip")
        })
}

/// Declared `Content-Length`, if present and valid.
#[must_use]
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, HeaderName};

    fn url() -> Url {
        Url::parse("http://127.0.0.1:8080/path").unwrap()
    }

    #[test]
    fn connection_close_cannot_be_overridden() {
        let mut caller = HeaderMap::new();
        caller.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        caller.insert(ACCEPT, HeaderValue::from_static("text/plain"));

        let headers = outbound_headers(&url(), &caller, Some("courier/test"), None);
        assert_eq!(headers[CONNECTION], "close");
        assert_eq!(headers[ACCEPT], "text/plain");
        assert_eq!(headers[USER_AGENT], "courier/test");
        assert_eq!(headers[HOST], "127.0.0.1:8080");
        assert!(headers.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn caller_headers_replace_defaults() {
        let mut caller = HeaderMap::new();
        caller.insert(USER_AGENT, HeaderValue::from_static("custom"));
        caller.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        caller.append(
            HeaderName::from_static("x-multi"),
            HeaderValue::from_static("a"),
        );
        caller.append(
            HeaderName::from_static("x-multi"),
            HeaderValue::from_static("b"),
        );

        let headers = outbound_headers(&url(), &caller, Some("courier/test"), Some(Some(4)));
        assert_eq!(headers[USER_AGENT], "custom");
        assert_eq!(headers[ACCEPT_ENCODING], "identity");
        assert_eq!(headers.get_all("x-multi").iter().count(), 2);
        assert_eq!(headers[CONTENT_LENGTH], "4");
    }

    #[test]
    fn unknown_length_body_is_chunked() {
        let headers = outbound_headers(&url(), &HeaderMap::new(), None, Some(None));
        assert_eq!(headers[TRANSFER_ENCODING], "chunked");
        assert!(headers.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn gzip_token_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_gzip_encoded(&headers));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("identity, GZip"));
        assert!(is_gzip_encoded(&headers));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("br"));
        assert!(!is_gzip_encoded(&headers));
    }
}
