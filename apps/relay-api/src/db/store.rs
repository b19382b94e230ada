use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StoreError;

/// Durable set of connection identifiers.
///
/// Backed by a Redis set in production and an in-memory set in tests.
/// Implementations must be safe to call concurrently: `put` and `delete`
/// for different ids take effect independently.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Insert `id`. Inserting an existing id is not an error.
    async fn put(&self, id: &str) -> Result<(), StoreError>;
    /// Delete `id`. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    /// Every stored id, in no particular order.
    async fn scan_all(&self) -> Result<Vec<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation (single process / tests)
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    ids: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn put(&self, id: &str) -> Result<(), StoreError> {
        self.ids.lock().insert(id.to_string());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.ids.lock().remove(id);
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.ids.lock().iter().cloned().collect())
    }
}
