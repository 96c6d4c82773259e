//! Path and query composition

use courier_client::{Result, Url};

use super::core::RequestBuilder;

/// Join `path` onto `base` and append `params` percent-encoded.
///
/// Relative paths resolve against `base` by the usual URL rules, so a base meant
/// as a directory needs a trailing `/`. Query parameters already present in
/// `path` are kept ahead of `params`.
///
/// # Errors
///
/// Returns a builder error when `path` cannot be joined onto `base`.
pub fn resolve_url<K, V>(base: &Url, path: &str, params: &[(K, V)]) -> Result<Url>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = base.join(path).map_err(courier_client::error::builder)?;
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    }
    Ok(url)
}

/// Treat `base` as a directory so relative paths extend it instead of replacing
/// its last segment.
pub(crate) fn as_directory(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

impl<D> RequestBuilder<D> {
    /// Append one query parameter, percent-encoded.
    #[must_use]
    pub fn query(self, name: &str, value: &str) -> Self {
        self.map(|mut spec| {
            spec.url.query_pairs_mut().append_pair(name, value);
            spec
        })
    }
}
