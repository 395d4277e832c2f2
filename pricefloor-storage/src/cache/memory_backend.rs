//! In-memory cache backend over a `HashMap`.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use pricefloor_core::PricefloorResult;

use super::traits::{CacheBackend, CacheEntry};

/// Process-local [`CacheBackend`] used by tests and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> PricefloorResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> PricefloorResult<()> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> PricefloorResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn entry_count(&self) -> PricefloorResult<u64> {
        Ok(self.entries.read().await.len() as u64)
    }
}
