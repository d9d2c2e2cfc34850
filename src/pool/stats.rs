//! Worker Pool Statistics Module
//!
//! Counts units of work through their lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Pool Stats ==
/// Live counters shared by the pool handle and its lanes.
#[derive(Debug, Default)]
pub struct PoolStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Undoes `record_submitted` for a unit the queue refused, counting it rejected.
    pub fn retract_submitted(&self) {
        self.submitted.fetch_sub(1, Ordering::SeqCst);
        self.record_rejected();
    }

    pub fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::SeqCst);
    }

    /// True once every accepted unit has completed, failed or been dropped.
    pub fn is_idle(&self) -> bool {
        let finished = self.completed.load(Ordering::SeqCst)
            + self.failed.load(Ordering::SeqCst)
            + self.dropped.load(Ordering::SeqCst);
        finished >= self.submitted.load(Ordering::SeqCst)
    }

    // == Snapshot ==
    pub fn snapshot(&self, pool_size: usize) -> PoolStatsSnapshot {
        // Finished counters first, so submitted is never read behind them
        let completed = self.completed.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        let dropped = self.dropped.load(Ordering::SeqCst);

        PoolStatsSnapshot {
            pool_size,
            submitted: self.submitted.load(Ordering::SeqCst),
            completed,
            failed,
            rejected: self.rejected.load(Ordering::Relaxed),
            dropped,
        }
    }
}

// == Pool Stats Snapshot ==
/// Point-in-time copy of the pool counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatsSnapshot {
    /// Number of worker lanes
    pub pool_size: usize,
    /// Units accepted by `submit`
    pub submitted: u64,
    /// Units that ran to completion
    pub completed: u64,
    /// Units that panicked or returned an error
    pub failed: u64,
    /// Submissions refused after shutdown
    pub rejected: u64,
    /// Units still queued when the pool shut down
    pub dropped: u64,
}

impl PoolStatsSnapshot {
    /// Accepted units not yet finished.
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed + self.failed + self.dropped)
    }
}
