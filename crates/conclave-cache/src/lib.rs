//! # conclave-cache
//!
//! Tool-result caching (spec.md §3 "Cache", §4.2 pipeline step 3). A
//! small trait so the dispatcher and the `cached_tool_call` helper don't
//! care whether results land in-process or in a shared store.
//!
//! | Module | Contents |
//! |---|---|
//! | [`key`] | Cache key canonicalization |
//! | [`memory`] | In-process LRU+TTL backend (default) |
//! | [`redis`] | Shared Redis backend, behind the `redis-backend` feature |

pub mod key;
pub mod memory;

#[cfg(feature = "redis-backend")]
pub mod redis;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Backend-agnostic get/set/delete for tool-result caching. Implementors
/// own their own locking; callers only need `&self`.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

pub use memory::InMemoryCache;
