//! Redis Cache Store
//!
//! [`CacheStore`] over a long-lived `redis::aio::ConnectionManager`. The
//! manager is created once at startup and cloned per operation (clones share
//! the underlying multiplexed connection), so no call ever reconnects.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::instrument;

use crate::domain::CacheStore;
use crate::error::{Error, Result};

/// [`CacheStore`] backed by Redis.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore").finish_non_exhaustive()
    }
}

impl RedisCacheStore {
    /// Connect to Redis and build the shared connection manager.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Config(format!("Invalid Redis URL: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Config(format!("Failed to connect to Redis: {}", e)))?;
        Ok(Self { conn })
    }

    /// Build a store over an existing connection manager.
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Check that Redis is reachable.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::Config(format!("Redis ping failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::read_failed(key, e.to_string()))?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // SET ... EX carries the TTL with the write; the entry never exists
        // without an expiry.
        let _: () = conn
            .set_ex(key, value.as_ref(), ttl.as_secs())
            .await
            .map_err(|e| Error::write_failed(key, e.to_string()))?;
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(key, field, value)
            .await
            .map_err(|e| Error::write_failed(key, e.to_string()))?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        conn.hgetall(key)
            .await
            .map_err(|e| Error::read_failed(key, e.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key)
            .await
            .map_err(|e| Error::read_failed(key, e.to_string()))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: bool = conn
            .expire(key, ttl.as_secs() as i64)
            .await
            .map_err(|e| Error::write_failed(key, e.to_string()))?;
        Ok(())
    }
}
