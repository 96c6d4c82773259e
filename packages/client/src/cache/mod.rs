//! Disk-backed HTTP response cache
//!
//! A private cache shared between exchanges and drivers through `Arc<DiskCache>`.
//! Freshness follows `Cache-Control`/`Expires` with a `Last-Modified` heuristic; stale
//! entries with validators are revalidated conditionally. Bookkeeping is serialized
//! behind one lock so concurrent exchanges see consistent counters.

pub mod cache_control;
pub mod cache_entry;
pub mod cache_key;
pub mod cache_stats;
pub mod disk_cache;
pub mod http_date;
pub mod tee;

pub use cache_control::CacheControl;
pub use cache_entry::CacheEntry;
pub use cache_key::CacheKey;
pub use cache_stats::CacheStats;
pub use disk_cache::{CacheLookup, DiskCache};
pub use tee::{CacheTee, CacheWriter};
