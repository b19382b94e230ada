//! Connection registry: the set of connection ids believed reachable.

use std::sync::Arc;

use crate::db::store::ConnectionStore;
use crate::error::StoreError;

/// Add/remove/list over a [`ConnectionStore`].
///
/// Both mutations are idempotent. Store failures are returned as-is; retrying
/// is up to the caller.
#[derive(Clone)]
pub struct ConnectionRegistry {
    store: Arc<dyn ConnectionStore>,
}

impl ConnectionRegistry {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    /// Register `id`. A duplicate add is a no-op.
    pub async fn add(&self, id: &str) -> Result<(), StoreError> {
        self.store.put(id).await?;
        tracing::debug!(connection_id = %id, "connection registered");
        Ok(())
    }

    /// Unregister `id`. Removing an unknown id is a no-op.
    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(id).await?;
        tracing::debug!(connection_id = %id, "connection unregistered");
        Ok(())
    }

    /// Point-in-time snapshot of every registered id, unordered.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = self.store.scan_all().await?;
        // A store with multiset semantics must still yield each id once.
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
