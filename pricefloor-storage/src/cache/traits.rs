//! Cache backend trait and entry/statistics types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use pricefloor_core::{PriceRecord, PricefloorResult};

/// One cached lowest-price view plus its freshness metadata.
///
/// Entries expire by TTL, but TTL alone is not what keeps the cache honest:
/// the ingestion pipeline deletes entries explicitly on every successful
/// merge, so a cached value never outlives more than one TTL window of
/// staleness relative to the ledger's true minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub record: PriceRecord,
    pub cached_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    /// True once the entry's TTL window has fully elapsed at `now`.
    ///
    /// TTLs too large to represent never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(self.ttl) else {
            return false;
        };
        match self.cached_at.checked_add_signed(ttl) {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

/// Cache backend trait for pluggable implementations.
///
/// Backends are keyed by the canonical lookup key built by
/// [`PriceCache`](super::PriceCache); they store entries verbatim and do not
/// interpret TTLs (expiry is judged by the caller so that backends stay
/// trivial). Implementations must be safe for concurrent access.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get an entry, or `None` when the key is unknown.
    async fn get(&self, key: &str) -> PricefloorResult<Option<CacheEntry>>;

    /// Insert or replace an entry.
    async fn put(&self, key: &str, entry: CacheEntry) -> PricefloorResult<()>;

    /// Delete an entry. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> PricefloorResult<()>;

    /// Number of entries currently held (expired ones included).
    async fn entry_count(&self) -> PricefloorResult<u64>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricefloor_core::ProductId;

    fn entry(ttl: Duration, cached_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            record: PriceRecord {
                product_id: ProductId::parse("ABC-1").unwrap(),
                min_price: 10.0,
                updated_at: cached_at,
            },
            cached_at,
            ttl,
        }
    }

    #[test]
    fn entry_expires_after_its_ttl_window() {
        let t0 = Utc::now();
        let e = entry(Duration::from_secs(1800), t0);
        assert!(!e.is_expired(t0));
        assert!(!e.is_expired(t0 + chrono::Duration::seconds(1799)));
        assert!(e.is_expired(t0 + chrono::Duration::seconds(1800)));
    }

    #[test]
    fn zero_ttl_entry_is_immediately_expired() {
        let t0 = Utc::now();
        assert!(entry(Duration::ZERO, t0).is_expired(t0));
    }

    #[test]
    fn hit_rate_handles_the_empty_case() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            entry_count: 0,
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
