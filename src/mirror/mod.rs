//! Mirror Module
//!
//! Remote key/value mirror for tasks. The remote client itself lives outside this
//! crate; callers inject it through a `MirrorConnector`, and tests use the
//! in-memory fake.

mod handle;
mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::store::Task;

pub use handle::MirrorHandle;
pub use memory::{MemoryConnector, MemoryMirror};

// == Mirror Trait ==
/// String key/value operations of a remote cache.
#[async_trait]
pub trait Mirror: Send + Sync {
    /// Stores `value`, expiring it after `ttl` when given.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Round-trip check used on connect and by health reporting.
    async fn ping(&self) -> Result<()>;
}

/// Opens a connection to a mirror.
#[async_trait]
pub trait MirrorConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Mirror>>;
}

// == Task Record ==
/// JSON shape of a mirrored task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord<V> {
    pub key: String,
    pub value: V,
    pub timestamp: DateTime<Utc>,
}

/// Writes `task` to the mirror as JSON, optionally expiring after `ttl`.
pub async fn mirror_task<V>(
    handle: &MirrorHandle,
    task: &Task<V>,
    ttl: Option<Duration>,
) -> Result<()>
where
    V: Serialize,
{
    let record = TaskRecord {
        key: task.key().to_string(),
        value: task.payload().as_ref(),
        timestamp: task.created_at(),
    };
    let json = serde_json::to_string(&record)?;

    handle.client().await?.set(task.key(), json, ttl).await
}

/// Reads a mirrored task back. `None` when the mirror has no such key.
pub async fn fetch_mirrored<V>(handle: &MirrorHandle, key: &str) -> Result<Option<TaskRecord<V>>>
where
    V: DeserializeOwned,
{
    let client = handle.client().await?;
    match client.get(key).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
