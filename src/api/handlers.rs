//! API Handlers
//!
//! HTTP request handlers over the task store and the worker pool.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::mirror::{mirror_task, MemoryConnector, MirrorHandle};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, MirrorResponse, PatternQuery, PutResponse,
    PutTaskRequest, StatsResponse, TaskListResponse, TaskResponse,
};
use crate::pool::WorkerPool;
use crate::store::{generate_key, ExpiringTaskStore};

/// Application state shared across all handlers.
///
/// The store is already a shared handle; the pool and mirror sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub store: ExpiringTaskStore<Value>,
    pub pool: Arc<WorkerPool>,
    /// Remote mirror, `None` when disabled
    pub mirror: Option<Arc<MirrorHandle>>,
}

impl AppState {
    /// Creates a new AppState without a mirror.
    pub fn new(store: ExpiringTaskStore<Value>, pool: WorkerPool) -> Self {
        Self {
            store,
            pool: Arc::new(pool),
            mirror: None,
        }
    }

    /// Attaches a mirror handle.
    pub fn with_mirror(mut self, mirror: Arc<MirrorHandle>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Starts the worker pool, so this must run inside a tokio runtime. With
    /// `mirror_enabled` the in-process `MemoryConnector` is attached; a remote
    /// mirror goes through `with_mirror` instead.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = ExpiringTaskStore::new(config.store_config());
        let pool = WorkerPool::new(config.pool_size)?;
        let state = Self::new(store, pool);

        if config.mirror_enabled {
            info!("In-process memory mirror attached, no remote mirror client configured");
            return Ok(state.with_mirror(Arc::new(MirrorHandle::new(MemoryConnector::new()))));
        }
        Ok(state)
    }

    fn mirror(&self) -> Result<&Arc<MirrorHandle>> {
        self.mirror.as_ref().ok_or(CoreError::MirrorDisabled)
    }
}

/// Handler for PUT /tasks
///
/// Stores a task, generating a key when none is given.
pub async fn put_task_handler(
    State(state): State<AppState>,
    Json(req): Json<PutTaskRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CoreError::InvalidRequest(error_msg));
    }

    let key = req.key.unwrap_or_else(generate_key);
    state.store.put(key.clone(), req.value)?;

    Ok(Json(PutResponse::stored(key)))
}

/// Handler for PUT /tasks/deferred
///
/// Hands the store write to the worker pool and answers 202 straight away.
pub async fn put_deferred_handler(
    State(state): State<AppState>,
    Json(req): Json<PutTaskRequest>,
) -> Result<(StatusCode, Json<PutResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CoreError::InvalidRequest(error_msg));
    }

    let key = req.key.unwrap_or_else(generate_key);
    let store = state.store.clone();
    let task_key = key.clone();
    let value = req.value;
    state
        .pool
        .submit_fallible(move || store.put(task_key, value))?;

    debug!(key = %key, "Deferred task write queued");
    Ok((StatusCode::ACCEPTED, Json(PutResponse::queued(key))))
}

/// Handler for GET /tasks
///
/// Lists live tasks, optionally filtered by `?pattern=`, without removing them.
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> Result<Json<TaskListResponse>> {
    let pattern = query.pattern.as_deref().unwrap_or(".*");
    let tasks = state.store.tasks_matching(pattern)?;

    Ok(Json(TaskListResponse::new(
        tasks.iter().map(TaskResponse::from).collect(),
    )))
}

/// Handler for GET /tasks/:key
pub async fn get_task_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .store
        .get(&key)
        .ok_or_else(|| CoreError::NotFound(format!("task '{}'", key)))?;

    Ok(Json(GetResponse::new(key, value.as_ref().clone())))
}

/// Handler for DELETE /tasks/:key
pub async fn delete_task_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state
        .store
        .remove(&key)
        .ok_or_else(|| CoreError::NotFound(format!("task '{}'", key)))?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /tasks/poll
///
/// Takes the oldest task, or the oldest whose key matches `?pattern=`.
pub async fn poll_task_handler(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> Result<Json<TaskResponse>> {
    let task = match query.pattern.as_deref() {
        Some(pattern) => state
            .store
            .poll_task_matching(pattern)?
            .ok_or_else(|| CoreError::NotFound(format!("no task matching '{}'", pattern)))?,
        None => state
            .store
            .poll_task()
            .ok_or_else(|| CoreError::NotFound("no queued task".to_string()))?,
    };

    Ok(Json(TaskResponse::from(&task)))
}

/// Handler for POST /tasks/:key/mirror
///
/// Copies a live task to the mirror, expiring with the store TTL.
pub async fn mirror_task_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MirrorResponse>> {
    let mirror = state.mirror()?;
    let task = state
        .store
        .peek_task(&key)
        .ok_or_else(|| CoreError::NotFound(format!("task '{}'", key)))?;

    mirror_task(mirror, &task, state.store.ttl()).await?;

    Ok(Json(MirrorResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.store.stats(), state.pool.stats()))
}

/// Handler for GET /health
///
/// Reports the mirror as "disabled", "ok" or "unreachable".
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mirror = match &state.mirror {
        None => "disabled",
        Some(handle) => match handle.ping().await {
            Ok(()) => "ok",
            Err(_) => "unreachable",
        },
    };

    Json(HealthResponse::healthy(mirror))
}
