//! Client statistics tracking with atomic counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Thread-safe counters shared by every exchange an executor runs.
#[derive(Debug)]
pub struct ClientStats {
    requests_total: AtomicU64,
    requests_successful: AtomicU64,
    requests_failed: AtomicU64,
    requests_cancelled: AtomicU64,
    redirects_followed: AtomicU64,
    cache_served: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    connections_total: AtomicU64,
    connections_failed: AtomicU64,
    created_at: Instant,
}

impl Default for ClientStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_successful: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_cancelled: AtomicU64::new(0),
            redirects_followed: AtomicU64::new(0),
            cache_served: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            connections_failed: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.requests_successful.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.requests_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_redirect(&self) {
        self.redirects_followed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_served(&self) {
        self.cache_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_connection(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_failure(&self) {
        self.connections_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction of finished, uncancelled exchanges that succeeded.
    pub fn success_rate(&self) -> f64 {
        let successful = self.requests_successful.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let finished = successful + failed;
        if finished == 0 {
            0.0
        } else {
            successful as f64 / finished as f64
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_successful: self.requests_successful.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            requests_cancelled: self.requests_cancelled.load(Ordering::Relaxed),
            redirects_followed: self.redirects_followed.load(Ordering::Relaxed),
            cache_served: self.cache_served.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_failed: self.connections_failed.load(Ordering::Relaxed),
            uptime_secs: self.created_at.elapsed().as_secs(),
        }
    }
}

/// Immutable snapshot of client statistics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientStatsSnapshot {
    pub requests_total: u64,
    pub requests_successful: u64,
    pub requests_failed: u64,
    pub requests_cancelled: u64,
    pub redirects_followed: u64,
    pub cache_served: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub connections_total: u64,
    pub connections_failed: u64,
    pub uptime_secs: u64,
}
