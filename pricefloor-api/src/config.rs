//! API Configuration Module
//!
//! Service-level policy knobs loaded from environment variables with
//! sensible defaults for development. The defaults mirror the deployed
//! edge behavior: 1800s per-product cache TTL, 3600s snapshot TTL, 200-item
//! batch cap, and a 0.5 verification ratio.

use std::time::Duration;

/// API configuration for caching, batching, and verification policy.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// TTL for per-product cache entries and the matching
    /// `Cache-Control: max-age` on known-price responses.
    pub cache_ttl: Duration,

    /// Coarse edge TTL for the snapshot export.
    pub snapshot_ttl: Duration,

    /// Maximum items per ingest or batch-lookup call. Larger batches are
    /// rejected whole, with no partial processing.
    pub max_batch: usize,

    /// Verification gate ratio: a reported price is accepted only when it
    /// is at least `official * verify_ratio`. Policy constant, not law.
    pub verify_ratio: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(1800),
            snapshot_ttl: Duration::from_secs(3600),
            max_batch: 200,
            verify_ratio: 0.5,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PRICEFLOOR_CACHE_TTL_SECS`: per-product cache TTL (default: 1800)
    /// - `PRICEFLOOR_SNAPSHOT_TTL_SECS`: snapshot edge TTL (default: 3600)
    /// - `PRICEFLOOR_MAX_BATCH`: batch size cap (default: 200)
    /// - `PRICEFLOOR_VERIFY_RATIO`: verification gate ratio (default: 0.5)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_ttl = std::env::var("PRICEFLOOR_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let snapshot_ttl = std::env::var("PRICEFLOOR_SNAPSHOT_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.snapshot_ttl);

        let max_batch = std::env::var("PRICEFLOOR_MAX_BATCH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_batch);

        let verify_ratio = std::env::var("PRICEFLOOR_VERIFY_RATIO")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(defaults.verify_ratio);

        Self {
            cache_ttl,
            snapshot_ttl,
            max_batch,
            verify_ratio,
        }
    }
}
