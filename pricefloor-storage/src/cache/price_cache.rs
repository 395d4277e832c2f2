//! The reusable cache-aside abstraction for lowest-price lookups.

use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pricefloor_core::{PriceRecord, PricefloorResult, ProductId};

use super::traits::{CacheBackend, CacheEntry, CacheStats};

/// Result of a cache-aside read: the value (if any) and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOutcome {
    pub record: Option<PriceRecord>,
    pub from_cache: bool,
}

/// Cache-aside layer in front of the ledger.
///
/// All cache semantics live here: canonical key derivation, TTL-bound
/// population, expiry-on-read, and the invalidation hook the ingestion
/// pipeline calls after a successful merge. Backend failures are never
/// fatal; a broken cache degrades every read into a store read.
///
/// Only known prices are ever cached. "Not yet known" is expected to change
/// soon, and a negative entry would stall legitimate discovery for a full
/// TTL window.
pub struct PriceCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PriceCache {
    /// Create a cache-aside layer over `backend` with the given entry TTL.
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The entry TTL, as exposed to HTTP `Cache-Control` headers.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Canonical cache key for a product's lowest-price view.
    ///
    /// Single and batch lookups share this key, so one invalidation covers
    /// both read paths.
    pub fn key(product_id: &ProductId) -> String {
        format!("lowest:{product_id}")
    }

    /// Probe the cache for a product's lowest-price view.
    ///
    /// Expired entries are dropped and counted as misses. Backend errors
    /// are logged and counted as misses so callers fall through to the
    /// ledger.
    pub async fn lookup(&self, product_id: &ProductId) -> Option<PriceRecord> {
        let key = Self::key(product_id);
        match self.backend.get(&key).await {
            Ok(Some(entry)) => {
                if entry.is_expired(Utc::now()) {
                    if let Err(err) = self.backend.delete(&key).await {
                        tracing::warn!(%product_id, %err, "failed to drop expired cache entry");
                    }
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                } else {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(entry.record)
                }
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(err) => {
                tracing::warn!(%product_id, %err, "cache backend read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Populate the cache with a known price record.
    pub async fn store(&self, record: &PriceRecord) {
        let entry = CacheEntry {
            record: record.clone(),
            cached_at: Utc::now(),
            ttl: self.ttl,
        };
        let key = Self::key(&record.product_id);
        if let Err(err) = self.backend.put(&key, entry).await {
            tracing::warn!(product_id = %record.product_id, %err, "cache populate failed");
        }
    }

    /// Delete a product's cache entry.
    ///
    /// Called by the ingestion pipeline after every successful merge so the
    /// next read is forced to consult the ledger.
    pub async fn invalidate(&self, product_id: &ProductId) {
        if let Err(err) = self.backend.delete(&Self::key(product_id)).await {
            tracing::warn!(%product_id, %err, "cache invalidation failed");
        }
    }

    /// Cache-aside read: probe the cache, fall back to `fetch` on miss, and
    /// populate the cache only when `fetch` produced a known price.
    ///
    /// Errors from `fetch` (the ledger read) propagate; cache trouble does
    /// not.
    pub async fn get_or_populate<F, Fut>(
        &self,
        product_id: &ProductId,
        fetch: F,
    ) -> PricefloorResult<CacheOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PricefloorResult<Option<PriceRecord>>>,
    {
        if let Some(record) = self.lookup(product_id).await {
            return Ok(CacheOutcome {
                record: Some(record),
                from_cache: true,
            });
        }

        let fetched = fetch().await?;
        if let Some(record) = &fetched {
            self.store(record).await;
        }
        Ok(CacheOutcome {
            record: fetched,
            from_cache: false,
        })
    }

    /// Current hit/miss/entry counters.
    pub async fn stats(&self) -> CacheStats {
        let entry_count = self.backend.entry_count().await.unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
        }
    }
}
