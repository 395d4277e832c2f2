//! Storage traits for the ledger and the history log.
//!
//! The ledger is the single source of truth and the only place where the
//! per-product minimum is mutated. The upsert-min operation is the sole
//! serialization point for concurrent writers: implementations must give it
//! atomic compare-and-replace-if-lower semantics, no external locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use pricefloor_core::{HistoryEntry, LedgerStats, MergeOutcome, PriceRecord, PricefloorResult, ProductId};

/// Durable key-value table mapping product id to its minimum verified price.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Merge one verified price into the ledger row for `product_id`.
    ///
    /// Inserts a new row when absent. Otherwise replaces **both**
    /// `min_price` and `updated_at` together, and only when the incoming
    /// price is strictly lower than the stored minimum. The pairing is
    /// essential: `updated_at` must never be bumped by a price that did not
    /// actually lower the minimum.
    ///
    /// The merge is commutative and idempotent; concurrent merges for the
    /// same product must serialize inside the implementation.
    async fn upsert_min(
        &self,
        product_id: &ProductId,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> PricefloorResult<MergeOutcome>;

    /// Read one ledger row, or `None` when the product has never been seen.
    async fn read(&self, product_id: &ProductId) -> PricefloorResult<Option<PriceRecord>>;

    /// Read many ledger rows at once.
    ///
    /// Implementations with a bounded per-query key count (bind-parameter
    /// limits and the like) must chunk internally; the bound is a storage
    /// engine constraint and callers never see it. Missing products are
    /// simply absent from the returned map.
    async fn read_many(
        &self,
        product_ids: &[ProductId],
    ) -> PricefloorResult<HashMap<ProductId, PriceRecord>>;

    /// Aggregate row count and most recent update.
    ///
    /// Eventually consistent with concurrent writers is acceptable.
    async fn stats(&self) -> PricefloorResult<LedgerStats>;

    /// Full dump of `(product_id, min_price)` pairs for the snapshot export.
    ///
    /// Unbounded by design: truncating here would silently corrupt client
    /// bulk caches, so implementations return everything and callers flag
    /// size operationally.
    async fn scan_all(&self) -> PricefloorResult<Vec<(ProductId, f64)>>;
}

/// Append-only record of every accepted observation.
///
/// Write-only from the core's perspective: nothing here reads it back, and
/// it is never used to recompute the ledger.
#[async_trait]
pub trait HistoryLog: Send + Sync {
    async fn append(&self, entry: HistoryEntry) -> PricefloorResult<()>;
}
