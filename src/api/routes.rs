//! API Routes
//!
//! Configures the Axum router with all task endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_task_handler, get_task_handler, health_handler, list_tasks_handler,
    mirror_task_handler, poll_task_handler, put_deferred_handler, put_task_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /tasks` - Store a task
/// - `PUT /tasks/deferred` - Store a task through the worker pool
/// - `GET /tasks?pattern=` - List live tasks
/// - `GET /tasks/:key` - Retrieve a payload by key
/// - `DELETE /tasks/:key` - Remove a task
/// - `POST /tasks/poll?pattern=` - Take the oldest (matching) task
/// - `POST /tasks/:key/mirror` - Copy a task to the mirror
/// - `GET /stats` - Store and pool statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tasks", put(put_task_handler).get(list_tasks_handler))
        .route("/tasks/deferred", put(put_deferred_handler))
        .route("/tasks/poll", post(poll_task_handler))
        .route(
            "/tasks/:key",
            get(get_task_handler).delete(delete_task_handler),
        )
        .route("/tasks/:key/mirror", post(mirror_task_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
