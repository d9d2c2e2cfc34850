//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Sweep: Purges expired store entries at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
