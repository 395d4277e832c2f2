//! In-memory ledger and history log.
//!
//! Used by tests and local development. The ledger serializes merges behind
//! a write lock, which gives `upsert_min` the same atomic
//! compare-and-replace-if-lower semantics as the SQL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use pricefloor_core::{
    HistoryEntry, LedgerStats, MergeOutcome, PriceRecord, PricefloorResult, ProductId,
};

use crate::traits::{HistoryLog, LedgerStore};

/// In-memory [`LedgerStore`] over a `HashMap` behind a `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    rows: RwLock<HashMap<ProductId, PriceRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn upsert_min(
        &self,
        product_id: &ProductId,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> PricefloorResult<MergeOutcome> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(product_id) {
            Some(row) => {
                if price < row.min_price {
                    row.min_price = price;
                    row.updated_at = timestamp;
                    Ok(MergeOutcome { updated: true })
                } else {
                    Ok(MergeOutcome { updated: false })
                }
            }
            None => {
                rows.insert(
                    product_id.clone(),
                    PriceRecord {
                        product_id: product_id.clone(),
                        min_price: price,
                        updated_at: timestamp,
                    },
                );
                Ok(MergeOutcome { updated: true })
            }
        }
    }

    async fn read(&self, product_id: &ProductId) -> PricefloorResult<Option<PriceRecord>> {
        Ok(self.rows.read().await.get(product_id).cloned())
    }

    async fn read_many(
        &self,
        product_ids: &[ProductId],
    ) -> PricefloorResult<HashMap<ProductId, PriceRecord>> {
        let rows = self.rows.read().await;
        Ok(product_ids
            .iter()
            .filter_map(|id| rows.get(id).map(|row| (id.clone(), row.clone())))
            .collect())
    }

    async fn stats(&self) -> PricefloorResult<LedgerStats> {
        let rows = self.rows.read().await;
        Ok(LedgerStats {
            count: rows.len() as i64,
            last_updated: rows.values().map(|row| row.updated_at).max(),
        })
    }

    async fn scan_all(&self) -> PricefloorResult<Vec<(ProductId, f64)>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .map(|row| (row.product_id.clone(), row.min_price))
            .collect())
    }
}

/// In-memory [`HistoryLog`] backed by a `Vec`, preserving append order.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended entries, in append order. Test helper.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl HistoryLog for InMemoryHistory {
    async fn append(&self, entry: HistoryEntry) -> PricefloorResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
