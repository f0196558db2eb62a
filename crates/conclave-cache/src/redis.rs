//! Redis-backed cache, for deployments that share tool results across
//! multiple server processes. Ported from
//! `original_source/GitHub-Multi-Agent/shared/cache.py::RedisCache`; the
//! teacher has no redis dependency itself, so this backend's crate choice
//! is grounded in `other_examples/manifests/Async-IO-pierre_mcp_server`
//! and `other_examples/manifests/marlonsc-mcb`, both of which use the
//! `redis` crate with the same async connection-manager pattern.

use crate::{Cache, CacheError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;

pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(|e| CacheError::Backend(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await.map_err(|e| CacheError::Backend(e.to_string()))?;
        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::Backend(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(&value).map_err(|e| CacheError::Backend(e.to_string()))?;
        let ttl_secs = ttl.max(Duration::from_secs(1)).as_secs();
        conn.set_ex::<_, _, ()>(key, raw, ttl_secs)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(|e| CacheError::Backend(e.to_string()))
    }
}
