//! API Module
//!
//! HTTP handlers and routing for the task server REST API.
//!
//! # Endpoints
//! - `PUT /tasks`, `PUT /tasks/deferred` - Store a task
//! - `GET /tasks`, `GET /tasks/:key` - List or look up tasks
//! - `DELETE /tasks/:key` - Remove a task
//! - `POST /tasks/poll` - FIFO or pattern poll
//! - `POST /tasks/:key/mirror` - Copy a task to the mirror
//! - `GET /stats`, `GET /health` - Operational endpoints

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
