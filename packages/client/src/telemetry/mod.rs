//! Exchange counters kept per executor.

pub mod client_stats;

pub use client_stats::{ClientStats, ClientStatsSnapshot};
