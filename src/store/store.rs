//! Task Store Module
//!
//! Expiring key/value store that also keeps its entries in insertion order.
//! A direct index answers `get`; a time-ordered index answers FIFO and pattern polls.
//! Both live in one `TaskIndex` behind one lock, so no caller can observe an entry
//! in one index and not the other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::store::{
    generate_key, KeyPattern, StoreStats, StoreStatsSnapshot, Task, TimeOrder, MAX_KEY_LENGTH,
};

// == Store Config ==
/// Capacity and expiry settings for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of live entries (at least 1)
    pub max_entries: usize,
    /// Entry lifetime, `None` = entries never expire
    pub ttl: Option<Duration>,
}

impl StoreConfig {
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ttl,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Some(Duration::from_secs(3600)),
        }
    }
}

// == Direct Index Slot ==
#[derive(Debug)]
struct Slot<V> {
    /// Sequence number of the matching task in the time-ordered index
    seq: u64,
    payload: Arc<V>,
    inserted: Instant,
}

// == Task Index ==
/// Both indexes plus counters. Not synchronized; `ExpiringTaskStore` owns the lock.
///
/// TTL is the same for every entry and a re-put moves the key to the tail, so
/// expired entries always form a prefix of the time-ordered index.
#[derive(Debug)]
pub struct TaskIndex<V> {
    direct: HashMap<String, Slot<V>>,
    order: TimeOrder<V>,
    stats: StoreStats,
    max_entries: usize,
    ttl: Option<Duration>,
}

impl<V> TaskIndex<V> {
    // == Constructor ==
    pub fn new(config: StoreConfig) -> Self {
        Self {
            direct: HashMap::new(),
            order: TimeOrder::new(),
            stats: StoreStats::new(),
            max_entries: config.max_entries.max(1),
            ttl: config.ttl,
        }
    }

    // == Put ==
    /// Inserts a payload, superseding any live entry under the same key.
    ///
    /// The superseded task leaves the time-ordered index and the new one is appended
    /// at the tail. Inserting a new key at capacity evicts the oldest entry.
    pub fn put(&mut self, key: String, payload: Arc<V>) -> Result<()> {
        validate_key(&key)?;
        self.purge_expired();

        let superseded = match self.direct.remove(&key) {
            Some(old) => {
                self.order.remove(old.seq);
                true
            }
            None => false,
        };

        if !superseded && self.direct.len() >= self.max_entries {
            self.evict_oldest();
        }

        let task = Task::from_shared(key.clone(), Arc::clone(&payload));
        let inserted = task.inserted();
        let seq = self.order.push(task);
        self.direct.insert(
            key,
            Slot {
                seq,
                payload,
                inserted,
            },
        );

        self.stats.record_put(superseded);
        Ok(())
    }

    // == Get ==
    /// Returns the live payload for `key`. Expired entries read as absent.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        match self.direct.get(key) {
            Some(slot) if !self.slot_expired(slot) => {
                self.stats.record_hit();
                Some(Arc::clone(&slot.payload))
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the live task for `key` without removing it. Not counted in stats.
    pub fn peek_task(&self, key: &str) -> Option<Task<V>> {
        let slot = self.direct.get(key)?;
        if self.slot_expired(slot) {
            return None;
        }
        self.order.get(slot.seq).cloned()
    }

    /// Returns true if `key` is live. Does not count as a hit or miss.
    pub fn contains_key(&self, key: &str) -> bool {
        self.direct
            .get(key)
            .is_some_and(|slot| !self.slot_expired(slot))
    }

    // == Poll ==
    /// Removes and returns the oldest live task.
    pub fn poll(&mut self) -> Option<Task<V>> {
        self.purge_expired();

        let (_, task) = self.order.pop_oldest()?;
        self.direct.remove(task.key());
        self.stats.record_poll();
        Some(task)
    }

    // == Poll Matching ==
    /// Removes and returns the oldest live task whose key matches `pattern`.
    ///
    /// Linear in the number of entries.
    pub fn poll_matching(&mut self, pattern: &KeyPattern) -> Option<Task<V>> {
        self.purge_expired();

        let seq = self
            .order
            .iter()
            .find(|(_, task)| pattern.is_match(task.key()))
            .map(|(seq, _)| seq)?;

        let task = self.order.remove(seq)?;
        self.direct.remove(task.key());
        self.stats.record_poll();
        Some(task)
    }

    // == Matching ==
    /// Live tasks whose key matches `pattern`, oldest first. Removes nothing.
    pub fn matching(&self, pattern: &KeyPattern) -> Vec<Task<V>> {
        self.order
            .iter()
            .map(|(_, task)| task)
            .filter(|task| !task.is_expired(self.ttl) && pattern.is_match(task.key()))
            .cloned()
            .collect()
    }

    // == Remove ==
    /// Removes `key` from both indexes. An expired entry is dropped but reads as absent.
    pub fn remove(&mut self, key: &str) -> Option<Task<V>> {
        let slot = self.direct.remove(key)?;
        let task = self.order.remove(slot.seq)?;

        if task.is_expired(self.ttl) {
            self.stats.record_expirations(1);
            return None;
        }
        Some(task)
    }

    // == Purge Expired ==
    /// Removes every expired entry from both indexes.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut count = 0;
        while let Some((seq, task)) = self.order.peek_oldest() {
            if !task.is_expired(self.ttl) {
                break;
            }
            let key = task.key().to_string();
            self.order.remove(seq);
            self.direct.remove(&key);
            count += 1;
        }

        if count > 0 {
            self.stats.record_expirations(count);
            debug!(count, "purged expired tasks");
        }
        count
    }

    // == Length ==
    /// Number of entries in the time-ordered index.
    ///
    /// Expired entries count until they are purged.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Stats ==
    pub fn stats(&self) -> StoreStatsSnapshot {
        self.stats.snapshot(self.direct.len())
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Checks that the two indexes describe the same entries.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.direct.len() == self.order.len()
            && self.direct.iter().all(|(key, slot)| {
                self.order
                    .get(slot.seq)
                    .is_some_and(|task| task.key() == key && Arc::ptr_eq(task.payload(), &slot.payload))
            })
    }

    fn evict_oldest(&mut self) {
        if let Some((_, task)) = self.order.pop_oldest() {
            self.direct.remove(task.key());
            self.stats.record_eviction();
            debug!(key = task.key(), "evicted oldest task to stay within capacity");
        }
    }

    fn slot_expired(&self, slot: &Slot<V>) -> bool {
        self.ttl.is_some_and(|ttl| slot.inserted.elapsed() >= ttl)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CoreError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CoreError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

// == Expiring Task Store ==
/// Thread-safe handle to a `TaskIndex`. Clones share the same store.
///
/// Lookups take the read lock; every operation that touches an index takes the
/// write lock, so both indexes change together.
#[derive(Debug)]
pub struct ExpiringTaskStore<V> {
    inner: Arc<RwLock<TaskIndex<V>>>,
}

impl<V> Clone for ExpiringTaskStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for ExpiringTaskStore<V> {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl<V> ExpiringTaskStore<V> {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TaskIndex::new(config))),
        }
    }

    /// Inserts or supersedes `key`.
    pub fn put(&self, key: impl Into<String>, payload: V) -> Result<()> {
        self.put_shared(key, Arc::new(payload))
    }

    /// Like `put`, for a payload the caller already shares.
    pub fn put_shared(&self, key: impl Into<String>, payload: Arc<V>) -> Result<()> {
        self.inner.write().put(key.into(), payload)
    }

    /// Inserts under a generated key and returns the key.
    pub fn put_generated(&self, payload: V) -> Result<String> {
        let key = generate_key();
        self.put(key.clone(), payload)?;
        Ok(key)
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.inner.read().get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// The live task for `key`, left in place.
    pub fn peek_task(&self, key: &str) -> Option<Task<V>> {
        self.inner.read().peek_task(key)
    }

    /// Removes and returns the oldest live task.
    pub fn poll_task(&self) -> Option<Task<V>> {
        self.inner.write().poll()
    }

    /// Removes and returns the oldest live task whose whole key matches `pattern`.
    ///
    /// A malformed pattern is rejected before the store is touched.
    pub fn poll_task_matching(&self, pattern: &str) -> Result<Option<Task<V>>> {
        let pattern = KeyPattern::new(pattern)?;
        Ok(self.poll_task_with(&pattern))
    }

    /// Pattern poll with a precompiled pattern.
    pub fn poll_task_with(&self, pattern: &KeyPattern) -> Option<Task<V>> {
        self.inner.write().poll_matching(pattern)
    }

    /// Live tasks whose key matches `pattern`, oldest first, without removing them.
    pub fn tasks_matching(&self, pattern: &str) -> Result<Vec<Task<V>>> {
        let pattern = KeyPattern::new(pattern)?;
        Ok(self.inner.read().matching(&pattern))
    }

    pub fn remove(&self, key: &str) -> Option<Task<V>> {
        self.inner.write().remove(key)
    }

    pub fn purge_expired(&self) -> usize {
        self.inner.write().purge_expired()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn stats(&self) -> StoreStatsSnapshot {
        self.inner.read().stats()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.inner.read().ttl()
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.inner.read().is_consistent()
    }
}
