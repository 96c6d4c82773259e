//! Default values for `ClientConfig`.

use std::time::Duration;

use http::HeaderMap;

use super::types::ClientConfig;
use crate::connect::TrustMode;

/// Default timeout for connect, write and read phases.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Follow-up hop limit when redirects are followed.
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// `courier/<crate version>`
#[must_use]
pub fn default_user_agent() -> String {
    format!("courier/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
            allow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            trust_mode: TrustMode::Default,
            use_native_certs: true,
            default_headers: HeaderMap::new(),
            cache: None,
        }
    }
}
