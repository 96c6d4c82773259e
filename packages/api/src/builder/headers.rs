//! Header management
//!
//! Caller headers are appended in order; entity builders only fill in
//! `Content-Type` when the caller has not set one.

use http::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue, USER_AGENT};

use super::core::{ContentType, RequestBuilder};

impl<D> RequestBuilder<D> {
    /// Add a header, keeping any earlier values for the same name.
    #[must_use]
    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.try_map(|mut spec| {
            let key = HeaderName::try_from(key).map_err(|e| invalid(e.into()))?;
            let value = HeaderValue::try_from(value).map_err(|e| invalid(e.into()))?;
            spec.headers.append(key, value);
            Ok(spec)
        })
    }

    /// Add several headers at once.
    #[must_use]
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (key, value)| builder.header(key, value))
    }

    #[must_use]
    pub fn content_type(self, content_type: ContentType) -> Self {
        self.map(|mut spec| {
            spec.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
            spec
        })
    }

    #[must_use]
    pub fn accept(self, accept: &str) -> Self {
        self.header(ACCEPT, accept)
    }

    /// Replace the client's default `User-Agent` for this request.
    #[must_use]
    pub fn user_agent(self, user_agent: &str) -> Self {
        self.try_map(|mut spec| {
            let value =
                HeaderValue::from_str(user_agent).map_err(courier_client::error::builder)?;
            spec.headers.insert(USER_AGENT, value);
            Ok(spec)
        })
    }

    pub(crate) fn default_content_type(self, content_type: ContentType) -> Self {
        self.map(|mut spec| {
            if !spec.headers.contains_key(CONTENT_TYPE) {
                spec.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
            }
            spec
        })
    }
}

fn invalid(e: http::Error) -> courier_client::Error {
    courier_client::error::builder(e)
}
