//! Cache statistics and metrics tracking

use serde::Serialize;

/// Request accounting, updated under the cache lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CacheCounters {
    pub request_count: u64,
    pub network_count: u64,
    pub hit_count: u64,
    pub evictions: u64,
}

/// Point-in-time view of a [`DiskCache`](super::DiskCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests that consulted the cache
    pub request_count: u64,
    /// Requests that went to the network, including conditional revalidations
    pub network_count: u64,
    /// Requests answered from stored bodies, including revalidated ones
    pub hit_count: u64,
    pub evictions: u64,
    pub entry_count: u64,
    pub size_bytes: u64,
    pub max_size_bytes: u64,
}

impl CacheStats {
    /// Hits over requests, 0.0 when nothing has been requested.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.hit_count as f64 / self.request_count as f64
        }
    }
}
