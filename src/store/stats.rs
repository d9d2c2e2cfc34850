//! Store Statistics Module
//!
//! Tracks store activity: hits, misses, supersessions, polls, evictions and expirations.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Store Stats ==
/// Live counters, updated under either the read or the write lock.
#[derive(Debug, Default)]
pub struct StoreStats {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    supersedes: AtomicU64,
    polls: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a put; `superseded` when the key was already live.
    pub fn record_put(&self, superseded: bool) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        if superseded {
            self.supersedes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: usize) {
        self.expirations.fetch_add(count as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters; `live_entries` is supplied by the store.
    pub fn snapshot(&self, live_entries: usize) -> StoreStatsSnapshot {
        StoreStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            supersedes: self.supersedes.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            live_entries,
        }
    }
}

// == Store Stats Snapshot ==
/// Point-in-time copy of the store counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStatsSnapshot {
    /// Successful `get` calls
    pub hits: u64,
    /// `get` calls on absent or expired keys
    pub misses: u64,
    pub puts: u64,
    /// Puts that replaced a live key
    pub supersedes: u64,
    /// Tasks handed out by FIFO or pattern polling
    pub polls: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries removed after their TTL elapsed
    pub expirations: u64,
    pub live_entries: usize,
}

impl StoreStatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
