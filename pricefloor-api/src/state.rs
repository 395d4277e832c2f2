//! Shared application state for Axum routers.

use std::sync::Arc;

use pricefloor_storage::{CacheBackend, HistoryLog, LedgerStore, PriceCache};

use crate::config::ApiConfig;
use crate::ingest::IngestPipeline;
use crate::oracle::{VerificationOracle, VerifyPolicy};

/// Application-wide state shared across all routes.
///
/// The ledger and cache are the only shared resources; each request is an
/// independent, short-lived unit of work on top of them. Storage, history,
/// and the oracle sit behind trait objects so tests can drive the real
/// router with in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    /// Single source of truth for per-product minimums.
    pub ledger: Arc<dyn LedgerStore>,
    /// Cache-aside layer shared by the read path and the ingestion
    /// pipeline's invalidation hook.
    pub cache: Arc<PriceCache>,
    /// The verification-gated write path.
    pub pipeline: Arc<IngestPipeline>,
    /// Service policy knobs (TTLs, batch cap, verification ratio).
    pub config: ApiConfig,
}

impl AppState {
    /// Wire the service together from its collaborators.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        history: Arc<dyn HistoryLog>,
        oracle: Arc<dyn VerificationOracle>,
        cache_backend: Arc<dyn CacheBackend>,
        config: ApiConfig,
    ) -> Self {
        let cache = Arc::new(PriceCache::new(cache_backend, config.cache_ttl));
        let pipeline = Arc::new(IngestPipeline::new(
            ledger.clone(),
            history,
            cache.clone(),
            oracle,
            VerifyPolicy::new(config.verify_ratio),
            config.max_batch,
        ));
        Self {
            ledger,
            cache,
            pipeline,
            config,
        }
    }
}
