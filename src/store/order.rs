//! Time Order Module
//!
//! Insertion-ordered index of tasks backing FIFO and pattern polling.

use std::collections::BTreeMap;

use crate::store::Task;

// == Time Order ==
/// Tasks keyed by a monotonically increasing sequence number.
///
/// - First entry = oldest insertion
/// - Last entry = newest insertion
///
/// Removing a task by sequence number is O(log n), so superseding a key does not
/// need a linear scan.
#[derive(Debug)]
pub struct TimeOrder<V> {
    tasks: BTreeMap<u64, Task<V>>,
    next_seq: u64,
}

impl<V> Default for TimeOrder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TimeOrder<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_seq: 0,
        }
    }

    // == Push ==
    /// Appends a task at the tail and returns its sequence number.
    pub fn push(&mut self, task: Task<V>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(seq, task);
        seq
    }

    // == Remove ==
    /// Removes the task with the given sequence number.
    pub fn remove(&mut self, seq: u64) -> Option<Task<V>> {
        self.tasks.remove(&seq)
    }

    // == Pop Oldest ==
    /// Removes and returns the oldest task with its sequence number.
    pub fn pop_oldest(&mut self) -> Option<(u64, Task<V>)> {
        self.tasks.pop_first()
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<(u64, &Task<V>)> {
        self.tasks.first_key_value().map(|(seq, task)| (*seq, task))
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Task<V>)> {
        self.tasks.iter().map(|(seq, task)| (*seq, task))
    }

    pub fn get(&self, seq: u64) -> Option<&Task<V>> {
        self.tasks.get(&seq)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
