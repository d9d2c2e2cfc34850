//! Store Module
//!
//! In-process expiring task store with FIFO and pattern-based polling.

mod order;
mod pattern;
mod stats;
#[allow(clippy::module_inception)]
mod store;
mod task;


// Re-export public types
pub use order::TimeOrder;
pub use pattern::KeyPattern;
pub use stats::{StoreStats, StoreStatsSnapshot};
pub use store::{ExpiringTaskStore, StoreConfig, TaskIndex};
pub use task::{generate_key, Task};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
