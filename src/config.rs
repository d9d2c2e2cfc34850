//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::store::StoreConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of live tasks the store can hold
    pub max_entries: usize,
    /// Task TTL in seconds, 0 = tasks never expire
    pub task_ttl: u64,
    /// Number of worker lanes
    pub pool_size: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Whether to attach the in-process `MemoryConnector` mirror.
    ///
    /// Nothing leaves the process; a remote client has to be wired in by the
    /// embedding code through `AppState::with_mirror`.
    pub mirror_enabled: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum live tasks (default: 10000)
    /// - `TASK_TTL` - Task TTL in seconds, 0 disables expiry (default: 3600)
    /// - `POOL_SIZE` - Worker lanes (default: 4)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 30)
    /// - `MIRROR_ENABLED` - Attach the in-process memory mirror, not a remote one (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            task_ttl: env_or("TASK_TTL", defaults.task_ttl),
            pool_size: env_or("POOL_SIZE", defaults.pool_size),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            mirror_enabled: env_or("MIRROR_ENABLED", defaults.mirror_enabled),
        }
    }

    /// Store settings derived from this configuration.
    pub fn store_config(&self) -> StoreConfig {
        let ttl = (self.task_ttl > 0).then(|| Duration::from_secs(self.task_ttl));
        StoreConfig::new(self.max_entries, ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            task_ttl: 3600,
            pool_size: 4,
            server_port: 3000,
            sweep_interval: 30,
            mirror_enabled: false,
        }
    }
}

/// Parses `name` from the environment, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
