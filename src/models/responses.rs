//! Response DTOs for the task API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::pool::PoolStatsSnapshot;
use crate::store::{StoreStatsSnapshot, Task};

/// Response body for PUT /tasks and PUT /tasks/deferred
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    /// The key the task is stored under
    pub key: String,
}

impl PutResponse {
    /// The task was stored before the response was sent
    pub fn stored(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Task '{}' stored successfully", key),
            key,
        }
    }

    /// The store write was handed to the worker pool
    pub fn queued(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Task '{}' queued for storage", key),
            key,
        }
    }
}

/// Response body for GET /tasks/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A task as returned by polling and listing
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub key: String,
    pub value: Value,
    /// Creation time in RFC 3339 format
    pub created_at: String,
}

impl From<&Task<Value>> for TaskResponse {
    fn from(task: &Task<Value>) -> Self {
        Self {
            key: task.key().to_string(),
            value: task.payload().as_ref().clone(),
            created_at: task.created_at().to_rfc3339(),
        }
    }
}

/// Response body for GET /tasks
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub count: usize,
    /// Matching tasks, oldest first
    pub tasks: Vec<TaskResponse>,
}

impl TaskListResponse {
    pub fn new(tasks: Vec<TaskResponse>) -> Self {
        Self {
            count: tasks.len(),
            tasks,
        }
    }
}

/// Response body for DELETE /tasks/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was removed
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Task '{}' removed successfully", key),
            key,
        }
    }
}

/// Response body for POST /tasks/:key/mirror
#[derive(Debug, Clone, Serialize)]
pub struct MirrorResponse {
    pub message: String,
    pub key: String,
}

impl MirrorResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Task '{}' mirrored successfully", key),
            key,
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub store: StoreStatsSnapshot,
    /// Store hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub pool: PoolStatsSnapshot,
}

impl StatsResponse {
    pub fn new(store: StoreStatsSnapshot, pool: PoolStatsSnapshot) -> Self {
        Self {
            hit_rate: store.hit_rate(),
            store,
            pool,
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Mirror status: "disabled", "ok" or "unreachable"
    pub mirror: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(mirror: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            mirror: mirror.into(),
        }
    }
}
