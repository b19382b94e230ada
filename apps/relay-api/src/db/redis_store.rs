use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::store::ConnectionStore;
use crate::error::StoreError;

/// Redis-backed connection store: one set key, one member per connection id.
///
/// `SADD`/`SREM` are atomic per member, which gives last-writer-wins per id
/// without any locking on our side.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisStore {
    /// Connect to Redis and bind the store to `key`.
    pub async fn connect(redis_url: &str, key: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        let key = key.into();
        tracing::info!(%key, "redis connection store ready");
        Ok(Self { conn, key })
    }
}

#[async_trait]
impl ConnectionStore for RedisStore {
    async fn put(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(&self.key, id).await.map_err(|e| {
            tracing::error!(?e, connection_id = %id, "redis sadd failed");
            StoreError::from(e)
        })
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(&self.key, id).await.map_err(|e| {
            tracing::error!(?e, connection_id = %id, "redis srem failed");
            StoreError::from(e)
        })
    }

    async fn scan_all(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.smembers(&self.key).await.map_err(|e| {
            tracing::error!(?e, "redis smembers failed");
            StoreError::from(e)
        })
    }
}
