//! Mirror Handle
//!
//! Process-wide mirror connection with lazy initialization and explicit teardown.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::Result;
use crate::mirror::{Mirror, MirrorConnector};

// == Mirror Handle ==
/// Connects on first use and keeps the connection until `teardown`.
///
/// Share one handle (behind an `Arc`) and pass it to whatever needs the mirror.
/// A failed connect is not cached, so the next call tries again.
pub struct MirrorHandle {
    connector: Arc<dyn MirrorConnector>,
    client: Mutex<Option<Arc<dyn Mirror>>>,
}

impl MirrorHandle {
    pub fn new(connector: impl MirrorConnector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            client: Mutex::new(None),
        }
    }

    // == Client ==
    /// Returns the live connection, connecting and pinging it first if needed.
    pub async fn client(&self) -> Result<Arc<dyn Mirror>> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = self.connector.connect().await?;
        if let Err(e) = client.ping().await {
            error!(error = %e, "Failed to connect to mirror");
            return Err(e);
        }
        info!("Connected to mirror");

        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Pings through the connection, connecting first if needed.
    pub async fn ping(&self) -> Result<()> {
        self.client().await?.ping().await
    }

    // == Teardown ==
    /// Drops the connection. A later `client` call reconnects.
    pub async fn teardown(&self) {
        if self.client.lock().await.take().is_some() {
            info!("Mirror connection closed");
        }
    }
}

impl std::fmt::Debug for MirrorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::mirror::MemoryConnector;

    #[tokio::test]
    async fn test_connects_lazily_once() {
        let connector = MemoryConnector::new();
        let connects = connector.connect_count();
        let handle = MirrorHandle::new(connector);

        assert!(!handle.is_connected().await);
        assert_eq!(connects(), 0);

        handle.client().await.unwrap();
        handle.client().await.unwrap();

        assert!(handle.is_connected().await);
        assert_eq!(connects(), 1);
    }

    #[tokio::test]
    async fn test_teardown_then_reconnect() {
        let connector = MemoryConnector::new();
        let connects = connector.connect_count();
        let handle = MirrorHandle::new(connector);

        handle.client().await.unwrap();
        handle.teardown().await;
        assert!(!handle.is_connected().await);

        handle.client().await.unwrap();
        assert_eq!(connects(), 2);
    }

    #[tokio::test]
    async fn test_failed_ping_is_not_cached() {
        let connector = MemoryConnector::new();
        let mirror = connector.mirror();
        let handle = MirrorHandle::new(connector);

        mirror.set_reachable(false);
        let result = handle.client().await;
        assert!(matches!(result, Err(CoreError::Mirror(_))));
        assert!(!handle.is_connected().await);

        mirror.set_reachable(true);
        assert!(handle.ping().await.is_ok());
        assert!(handle.is_connected().await);
    }
}
