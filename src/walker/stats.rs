//! Walk counters.

use crate::fetcher::RateInfo;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the counters of a walker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub files: u64,
    pub directories: u64,
    pub requests: u64,
    pub rate_limit_waits: u64,
}

impl WalkStats {
    /// Counter growth between two snapshots
    pub fn since(&self, earlier: &WalkStats) -> WalkStats {
        WalkStats {
            files: self.files.saturating_sub(earlier.files),
            directories: self.directories.saturating_sub(earlier.directories),
            requests: self.requests.saturating_sub(earlier.requests),
            rate_limit_waits: self.rate_limit_waits.saturating_sub(earlier.rate_limit_waits),
        }
    }
}

/// Shared counters, updated by every walk task
#[derive(Debug, Default)]
pub(crate) struct WalkCounters {
    files: AtomicU64,
    directories: AtomicU64,
    requests: AtomicU64,
    rate_limit_waits: AtomicU64,
    last_rate: Mutex<Option<RateInfo>>,
}

impl WalkCounters {
    pub(crate) fn record_file(&self) {
        self.files.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_directory(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rate_limit_wait(&self) {
        self.rate_limit_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rate(&self, rate: RateInfo) {
        *self.last_rate.lock() = Some(rate);
    }

    pub(crate) fn last_rate(&self) -> Option<RateInfo> {
        *self.last_rate.lock()
    }

    pub(crate) fn snapshot(&self) -> WalkStats {
        WalkStats {
            files: self.files.load(Ordering::Relaxed),
            directories: self.directories.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            rate_limit_waits: self.rate_limit_waits.load(Ordering::Relaxed),
        }
    }
}
