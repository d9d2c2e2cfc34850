//! In-memory mirror, for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::mirror::{Mirror, MirrorConnector};

// == Memory Mirror ==
/// String map with optional per-key expiry.
#[derive(Debug)]
pub struct MemoryMirror {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    reachable: AtomicBool,
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            reachable: AtomicBool::new(true),
        }
    }
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the mirror going away; every call fails while unreachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoreError::Mirror("mirror unreachable".to_string()))
        }
    }
}

#[async_trait]
impl Mirror for MemoryMirror {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        self.check_reachable()?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_reachable()?;
        let mut entries = self.entries.lock();
        let expired = matches!(
            entries.get(key),
            Some((_, Some(expires_at))) if Instant::now() >= *expires_at
        );
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_reachable()?;
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check_reachable()
    }
}

// == Memory Connector ==
/// Hands out one shared `MemoryMirror` and counts connects.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    mirror: Arc<MemoryMirror>,
    connects: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mirror every connection points at.
    pub fn mirror(&self) -> Arc<MemoryMirror> {
        Arc::clone(&self.mirror)
    }

    /// Returns a reader for the number of `connect` calls so far.
    pub fn connect_count(&self) -> impl Fn() -> usize {
        let connects = Arc::clone(&self.connects);
        move || connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MirrorConnector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn Mirror>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.mirror.check_reachable()?;
        Ok(self.mirror.clone() as Arc<dyn Mirror>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let mirror = MemoryMirror::new();

        mirror.set("k", "v".to_string(), None).await.unwrap();
        assert_eq!(mirror.get("k").await.unwrap().as_deref(), Some("v"));

        mirror.delete("k").await.unwrap();
        assert!(mirror.get("k").await.unwrap().is_none());
        assert!(mirror.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_read() {
        let mirror = MemoryMirror::new();

        mirror
            .set("k", "v".to_string(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(mirror.get("k").await.unwrap().is_none());
        assert_eq!(mirror.len(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_fails_every_call() {
        let mirror = MemoryMirror::new();
        mirror.set_reachable(false);

        assert!(mirror.ping().await.is_err());
        assert!(mirror.set("k", "v".to_string(), None).await.is_err());
        assert!(mirror.get("k").await.is_err());
    }
}
