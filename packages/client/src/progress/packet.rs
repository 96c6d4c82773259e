use serde::{Deserialize, Serialize};

/// One byte-transfer progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPacket {
    /// Bytes transferred so far in this direction
    pub bytes_processed: u64,
    /// Total bytes, `None` when unknown
    pub total_bytes: Option<u64>,
    pub is_download: bool,
}

impl ProgressPacket {
    #[must_use]
    pub const fn upload(bytes_processed: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_processed,
            total_bytes,
            is_download: false,
        }
    }

    #[must_use]
    pub const fn download(bytes_processed: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_processed,
            total_bytes,
            is_download: true,
        }
    }

    /// Total with `-1` standing in for unknown.
    #[must_use]
    pub fn total_bytes_or_unknown(&self) -> i64 {
        self.total_bytes
            .and_then(|total| i64::try_from(total).ok())
            .unwrap_or(-1)
    }

    /// Completed fraction in `0.0..=1.0`, when the total is known and non-zero.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => Some((self.bytes_processed as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }
}
