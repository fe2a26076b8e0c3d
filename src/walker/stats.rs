//! Run statistics and progress snapshots

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every role of a run
#[derive(Debug, Default)]
pub struct RunStats {
    /// Regular files found by traversal
    pub files_discovered: AtomicU64,

    /// Files fully hashed
    pub files_hashed: AtomicU64,

    /// Bytes digested
    pub bytes_hashed: AtomicU64,

    /// Non-regular entries skipped (symlinks, sockets, devices)
    pub skipped: AtomicU64,
}

impl RunStats {
    pub(crate) fn record_discovered(&self) {
        self.files_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hashed(&self, bytes: u64) {
        self.files_hashed.fetch_add(1, Ordering::Relaxed);
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self, elapsed: Duration) -> HashProgress {
        HashProgress {
            discovered: self.files_discovered.load(Ordering::Relaxed),
            hashed: self.files_hashed.load(Ordering::Relaxed),
            bytes: self.bytes_hashed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct HashProgress {
    pub discovered: u64,
    pub hashed: u64,
    pub bytes: u64,
    pub skipped: u64,
    pub elapsed: Duration,
}

impl HashProgress {
    /// Files hashed per second
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.hashed as f64 / secs
        } else {
            0.0
        }
    }

    /// Bytes hashed per second
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Paths discovered but not yet hashed
    pub fn in_flight(&self) -> u64 {
        self.discovered.saturating_sub(self.hashed)
    }
}
