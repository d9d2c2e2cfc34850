//! Worker Pool Module
//!
//! Runs submitted units of work on a fixed number of worker lanes.

#[allow(clippy::module_inception)]
mod pool;
mod stats;

pub use pool::WorkerPool;
pub use stats::{PoolStats, PoolStatsSnapshot};
