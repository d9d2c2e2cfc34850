//! Task Core - in-process task store and worker pool
//!
//! An expiring key/value store that keeps its entries in insertion order for FIFO
//! and pattern polling, a fixed-size worker pool for deferred work, and a thin
//! HTTP surface over both.

pub mod api;
pub mod config;
pub mod error;
pub mod mirror;
pub mod models;
pub mod pool;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CoreError, Result};
pub use pool::WorkerPool;
pub use store::{ExpiringTaskStore, StoreConfig, Task};
pub use tasks::spawn_sweep_task;
