//! In-process LRU+TTL cache backend, ported from
//! `original_source/GitHub-Multi-Agent/shared/cache.py::InMemoryLRUCache`.

use crate::{Cache, CacheError};
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry {
    value: Value,
    expires_at: Instant,
}

pub struct InMemoryCache {
    store: Mutex<LruCache<String, Entry>>,
}

impl InMemoryCache {
    pub fn new(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).expect("max(1) is never zero");
        Self {
            store: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut store = self.store.lock();
        let Some(entry) = store.get(key) else {
            return Ok(None);
        };
        if entry.expires_at < Instant::now() {
            store.pop(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl.max(Duration::from_secs(1));
        self.store.lock().put(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.lock().pop(key);
        Ok(())
    }
}
