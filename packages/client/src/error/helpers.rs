use std::fmt;

/// A marker type to indicate that an operation timed out.
#[derive(Debug)]
pub struct TimedOut;

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timed out")
    }
}

impl std::error::Error for TimedOut {}

/// A marker type to indicate that the async worker dropped its event channel.
#[derive(Debug)]
pub struct WorkerLost;

impl fmt::Display for WorkerLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("event channel closed without a finished event")
    }
}

impl std::error::Error for WorkerLost {}

/// The redirect chain exceeded its hop limit.
#[derive(Debug)]
pub struct RedirectLimit {
    pub max: usize,
}

impl fmt::Display for RedirectLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "more than {} redirects", self.max)
    }
}

impl std::error::Error for RedirectLimit {}

/// TLS-specific error types
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),
    #[error("Protocol configuration failed: {0}")]
    Configuration(#[from] rustls::Error),
    #[error("No usable root certificates")]
    EmptyRootStore,
    #[error("Handshake failed: {0}")]
    Handshake(std::io::Error),
}

/// Disk cache error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache directory unavailable: {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Entry metadata corrupt: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
