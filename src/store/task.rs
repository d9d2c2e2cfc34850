//! Task Module
//!
//! Defines the immutable record kept in the time-ordered index.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

// == Task ==
/// An immutable keyed payload with its creation time.
///
/// The payload is shared, so cloning a `Task` never copies it. Re-putting a key
/// creates a new `Task`; an existing one is never changed.
#[derive(Debug)]
pub struct Task<V> {
    key: String,
    payload: Arc<V>,
    created_at: DateTime<Utc>,
    /// Monotonic insertion time, used for TTL checks
    inserted: Instant,
}

impl<V> Clone for Task<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            payload: Arc::clone(&self.payload),
            created_at: self.created_at,
            inserted: self.inserted,
        }
    }
}

impl<V> Task<V> {
    // == Constructor ==
    /// Creates a new task stamped with the current time.
    pub fn new(key: impl Into<String>, payload: V) -> Self {
        Self::from_shared(key, Arc::new(payload))
    }

    /// Creates a new task around an already shared payload.
    pub fn from_shared(key: impl Into<String>, payload: Arc<V>) -> Self {
        Self {
            key: key.into(),
            payload,
            created_at: Utc::now(),
            inserted: Instant::now(),
        }
    }

    /// Creates a task under a freshly generated key.
    pub fn with_generated_key(payload: V) -> Self {
        Self::new(generate_key(), payload)
    }

    // == Accessors ==
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &Arc<V> {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time elapsed since the task was created.
    pub fn age(&self) -> Duration {
        self.inserted.elapsed()
    }

    pub(crate) fn inserted(&self) -> Instant {
        self.inserted
    }

    // == Is Expired ==
    /// Checks the task against a TTL.
    ///
    /// Expired once the full TTL has elapsed (age >= ttl). No TTL means never.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.age() >= ttl)
    }

    /// Splits the task into its key and payload.
    pub fn into_parts(self) -> (String, Arc<V>) {
        (self.key, self.payload)
    }
}

// == Key Generation ==
/// Generates a time-prefixed task key.
///
/// Format: `YYYYMMDDhhmmss` followed by an upper-cased UUIDv7 in simple form, so
/// keys created in later seconds sort after earlier ones.
pub fn generate_key() -> String {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let id = Uuid::now_v7().simple().to_string().to_uppercase();
    format!("{}{}", stamp, id)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_task_creation() {
        let task = Task::new("job-1", 42u32);

        assert_eq!(task.key(), "job-1");
        assert_eq!(**task.payload(), 42);
        assert!(task.created_at() <= Utc::now());
    }

    #[test]
    fn test_clone_shares_payload() {
        let task = Task::new("job-1", vec![1, 2, 3]);
        let copy = task.clone();

        assert!(Arc::ptr_eq(task.payload(), copy.payload()));
        assert_eq!(task.created_at(), copy.created_at());
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let task = Task::new("job-1", ());
        assert!(!task.is_expired(None));
    }

    #[test]
    fn test_expiration() {
        let task = Task::new("job-1", ());
        let ttl = Some(Duration::from_millis(30));

        assert!(!task.is_expired(ttl));
        sleep(Duration::from_millis(50));
        assert!(task.is_expired(ttl));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let task = Task::new("job-1", ());
        assert!(task.is_expired(Some(Duration::ZERO)));
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_key();

        // 14 timestamp digits + 32 hex characters
        assert_eq!(key.len(), 46);
        assert!(key[..14].chars().all(|c| c.is_ascii_digit()));
        assert!(key[14..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_keys_are_distinct() {
        let a = Task::with_generated_key(1);
        let b = Task::with_generated_key(2);
        assert_ne!(a.key(), b.key());
    }
}
