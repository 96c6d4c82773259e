//! Header manipulation for redirects

use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION, WWW_AUTHENTICATE};
use url::Url;

/// Remove credentials when the next hop leaves the previous origin.
pub(crate) fn remove_sensitive_headers(headers: &mut HeaderMap, next: &Url, previous: &Url) {
    let cross_origin = next.scheme() != previous.scheme()
        || next.host_str() != previous.host_str()
        || next.port_or_known_default() != previous.port_or_known_default();
    if cross_origin {
        headers.remove(AUTHORIZATION);
        headers.remove(COOKIE);
        headers.remove("cookie2");
        headers.remove(PROXY_AUTHORIZATION);
        headers.remove(WWW_AUTHENTICATE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn credentials() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert(COOKIE, HeaderValue::from_static("session=1"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        headers
    }

    #[test]
    fn same_origin_keeps_credentials() {
        let mut headers = credentials();
        let previous = Url::parse("http://example.com/a").unwrap();
        let next = Url::parse("http://example.com:80/b").unwrap();
        remove_sensitive_headers(&mut headers, &next, &previous);
        assert!(headers.contains_key(AUTHORIZATION));
        assert!(headers.contains_key(COOKIE));
    }

    #[test]
    fn cross_origin_strips_credentials() {
        for next in ["http://other.com/b", "https://example.com/b", "http://example.com:8080/b"] {
            let mut headers = credentials();
            let previous = Url::parse("http://example.com/a").unwrap();
            let next = Url::parse(next).unwrap();
            remove_sensitive_headers(&mut headers, &next, &previous);
            assert!(!headers.contains_key(AUTHORIZATION), "{next}");
            assert!(!headers.contains_key(COOKIE), "{next}");
            assert!(headers.contains_key("x-trace"));
        }
    }
}
