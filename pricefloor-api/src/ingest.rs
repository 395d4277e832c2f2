//! Ingestion Pipeline
//!
//! Central control flow of the core: validates, verifies, and merges a
//! batch of incoming observations, then invalidates the read-path cache for
//! every product whose merge completed.
//!
//! Partial-failure semantics throughout: one bad item never aborts the
//! batch, and nothing past the batch-size gate escalates to a batch-level
//! error.

use chrono::Utc;
use futures_util::future;
use std::sync::Arc;

use pricefloor_core::{
    HistoryEntry, IngestSummary, Observation, PricefloorResult, ProductId, ValidationError,
};
use pricefloor_storage::{HistoryLog, LedgerStore, PriceCache};

use crate::oracle::{VerificationOracle, VerifyPolicy};

/// The verification-gated write path into the ledger.
pub struct IngestPipeline {
    ledger: Arc<dyn LedgerStore>,
    history: Arc<dyn HistoryLog>,
    cache: Arc<PriceCache>,
    oracle: Arc<dyn VerificationOracle>,
    policy: VerifyPolicy,
    max_batch: usize,
}

impl IngestPipeline {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        history: Arc<dyn HistoryLog>,
        cache: Arc<PriceCache>,
        oracle: Arc<dyn VerificationOracle>,
        policy: VerifyPolicy,
        max_batch: usize,
    ) -> Self {
        Self {
            ledger,
            history,
            cache,
            oracle,
            policy,
            max_batch,
        }
    }

    /// Process one batch of observations.
    ///
    /// Batch-level gate first: an oversize batch is rejected whole, with no
    /// partial processing. Per item the steps run strictly in order — shape
    /// validation, verification gate, merge, history append, cache
    /// invalidation — continuing past per-item failures.
    ///
    /// Verification calls are independent across items and run
    /// concurrently; merges and history appends then run in input order so
    /// the history log stays auditable. The merge itself is commutative, so
    /// this ordering is about the log, not correctness.
    pub async fn ingest(
        &self,
        items: &[Observation],
        reporter: &str,
    ) -> PricefloorResult<IngestSummary> {
        if items.len() > self.max_batch {
            return Err(ValidationError::BatchTooLarge {
                len: items.len(),
                max: self.max_batch,
            }
            .into());
        }

        let mut summary = IngestSummary {
            received: items.len(),
            ..IngestSummary::default()
        };

        // 1. Shape validation. Violations are skipped, not rejected: they
        //    never reached the verification gate.
        let prepared: Vec<Option<(ProductId, f64)>> =
            items.iter().map(Self::validate_shape).collect();
        summary.skipped = prepared.iter().filter(|p| p.is_none()).count();

        // 2. Verification gate, concurrently across items.
        let verdicts = future::join_all(prepared.iter().map(|maybe| async move {
            match maybe {
                Some((product_id, price)) => {
                    Some(self.policy.verify(&*self.oracle, product_id, *price).await)
                }
                None => None,
            }
        }))
        .await;

        // 3..5. Merge, history append, cache invalidation, in input order.
        let now = Utc::now();
        for (item, verdict) in prepared.iter().zip(verdicts) {
            let (product_id, price) = match (item, verdict) {
                (Some(valid), Some(true)) => valid,
                (Some((product_id, price)), Some(false)) => {
                    summary.rejected += 1;
                    tracing::warn!(%product_id, price, reporter, "rejected unverified observation");
                    continue;
                }
                _ => continue, // skipped by shape validation
            };

            match self.ledger.upsert_min(product_id, *price, now).await {
                Ok(_) => {
                    summary.stored += 1;
                    // Force the next read to consult the ledger, whether or
                    // not this particular merge lowered the minimum.
                    self.cache.invalidate(product_id).await;
                }
                Err(err) => {
                    tracing::warn!(%product_id, price, %err, "ledger merge failed, continuing batch");
                }
            }

            // Every verified observation lands in the history log, no-op
            // merges and failed merges included.
            let entry = HistoryEntry {
                product_id: product_id.clone(),
                price: *price,
                recorded_at: now,
            };
            if let Err(err) = self.history.append(entry).await {
                tracing::warn!(%product_id, %err, "history append failed");
            }
        }

        Ok(summary)
    }

    fn validate_shape(obs: &Observation) -> Option<(ProductId, f64)> {
        let product_id = ProductId::parse(&obs.prod_id).ok()?;
        if !obs.price.is_finite() || obs.price <= 0.0 {
            return None;
        }
        Some((product_id, obs.price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use pricefloor_core::{LedgerStats, MergeOutcome, OracleError, PriceRecord, StorageError};
    use pricefloor_storage::{InMemoryCacheBackend, InMemoryHistory, InMemoryLedger};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Oracle scripted per product id; unknown ids read as unknown product.
    struct ScriptedOracle {
        official: HashMap<String, f64>,
    }

    impl ScriptedOracle {
        fn new(entries: &[(&str, f64)]) -> Self {
            Self {
                official: entries
                    .iter()
                    .map(|(id, price)| (id.to_string(), *price))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl VerificationOracle for ScriptedOracle {
        async fn official_price(&self, product_id: &ProductId) -> Result<Option<f64>, OracleError> {
            Ok(self.official.get(product_id.as_str()).copied())
        }
    }

    struct Harness {
        ledger: Arc<InMemoryLedger>,
        history: Arc<InMemoryHistory>,
        cache: Arc<PriceCache>,
        pipeline: IngestPipeline,
    }

    fn harness(oracle: ScriptedOracle) -> Harness {
        let ledger = Arc::new(InMemoryLedger::new());
        let history = Arc::new(InMemoryHistory::new());
        let cache = Arc::new(PriceCache::new(
            Arc::new(InMemoryCacheBackend::new()),
            Duration::from_secs(1800),
        ));
        let pipeline = IngestPipeline::new(
            ledger.clone(),
            history.clone(),
            cache.clone(),
            Arc::new(oracle),
            VerifyPolicy::default(),
            200,
        );
        Harness {
            ledger,
            history,
            cache,
            pipeline,
        }
    }

    fn obs(prod_id: &str, price: f64) -> Observation {
        Observation {
            prod_id: prod_id.to_string(),
            price,
            page_type: None,
            observed_at: None,
        }
    }

    fn pid(raw: &str) -> ProductId {
        ProductId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn oversize_batch_is_rejected_whole() {
        let h = harness(ScriptedOracle::new(&[("A-1", 100.0)]));
        let batch: Vec<_> = (0..201).map(|_| obs("A-1", 100.0)).collect();

        let err = h.pipeline.ingest(&batch, "test").await.unwrap_err();
        assert!(err.to_string().contains("201"));

        // Zero items processed.
        assert!(h.ledger.read(&pid("A-1")).await.unwrap().is_none());
        assert!(h.history.entries().await.is_empty());
    }

    #[tokio::test]
    async fn counters_are_disjoint() {
        let h = harness(ScriptedOracle::new(&[("GOOD-1", 100.0), ("LOW-1", 100.0)]));
        let batch = vec![
            obs("GOOD-1", 90.0),      // verified and stored
            obs("bad id", 50.0),      // skipped: bad pattern
            obs("GOOD-1", -3.0),      // skipped: non-positive price
            obs("LOW-1", 10.0),       // rejected: undercuts 50.0 floor
            obs("UNKNOWN-9", 100.0),  // rejected: oracle knows no price
        ];

        let summary = h.pipeline.ingest(&batch, "test").await.unwrap();
        assert_eq!(summary.received, 5);
        assert_eq!(summary.stored, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.rejected, 2);
    }

    #[tokio::test]
    async fn history_preserves_input_order_and_grows_on_no_op_merges() {
        let h = harness(ScriptedOracle::new(&[("A-1", 100.0), ("B-2", 100.0)]));
        let batch = vec![obs("B-2", 90.0), obs("A-1", 80.0), obs("B-2", 95.0)];

        let summary = h.pipeline.ingest(&batch, "test").await.unwrap();
        assert_eq!(summary.stored, 3);

        let entries = h.history.entries().await;
        let order: Vec<_> = entries
            .iter()
            .map(|e| (e.product_id.as_str().to_string(), e.price))
            .collect();
        assert_eq!(
            order,
            vec![
                ("B-2".to_string(), 90.0),
                ("A-1".to_string(), 80.0),
                ("B-2".to_string(), 95.0),
            ]
        );

        // The 95.0 merge was a no-op; the ledger still holds 90.0.
        let row = h.ledger.read(&pid("B-2")).await.unwrap().unwrap();
        assert_eq!(row.min_price, 90.0);
    }

    #[tokio::test]
    async fn ingesting_the_same_observation_twice_is_idempotent() {
        let h = harness(ScriptedOracle::new(&[("A-1", 100.0)]));

        h.pipeline.ingest(&[obs("A-1", 80.0)], "test").await.unwrap();
        let first = h.ledger.read(&pid("A-1")).await.unwrap().unwrap();

        h.pipeline.ingest(&[obs("A-1", 80.0)], "test").await.unwrap();
        let second = h.ledger.read(&pid("A-1")).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(h.history.entries().await.len(), 2);
    }

    #[tokio::test]
    async fn successful_merge_invalidates_the_cache_entry() {
        let h = harness(ScriptedOracle::new(&[("A-1", 100.0)]));

        // Seed the cache with a stale view.
        h.cache
            .store(&PriceRecord {
                product_id: pid("A-1"),
                min_price: 99.0,
                updated_at: Utc::now(),
            })
            .await;
        assert!(h.cache.lookup(&pid("A-1")).await.is_some());

        h.pipeline.ingest(&[obs("A-1", 80.0)], "test").await.unwrap();

        // The next read must go to the ledger, not the stale entry.
        assert!(h.cache.lookup(&pid("A-1")).await.is_none());
    }

    /// Ledger that fails merges for one product id.
    struct FlakyLedger {
        inner: InMemoryLedger,
        poison: String,
    }

    #[async_trait]
    impl LedgerStore for FlakyLedger {
        async fn upsert_min(
            &self,
            product_id: &ProductId,
            price: f64,
            timestamp: DateTime<Utc>,
        ) -> PricefloorResult<MergeOutcome> {
            if product_id.as_str() == self.poison {
                return Err(StorageError::Query {
                    reason: "write failed".to_string(),
                }
                .into());
            }
            self.inner.upsert_min(product_id, price, timestamp).await
        }

        async fn read(&self, product_id: &ProductId) -> PricefloorResult<Option<PriceRecord>> {
            self.inner.read(product_id).await
        }

        async fn read_many(
            &self,
            product_ids: &[ProductId],
        ) -> PricefloorResult<HashMap<ProductId, PriceRecord>> {
            self.inner.read_many(product_ids).await
        }

        async fn stats(&self) -> PricefloorResult<LedgerStats> {
            self.inner.stats().await
        }

        async fn scan_all(&self) -> PricefloorResult<Vec<(ProductId, f64)>> {
            self.inner.scan_all().await
        }
    }

    #[tokio::test]
    async fn store_failure_on_one_item_does_not_abort_the_batch() {
        let ledger = Arc::new(FlakyLedger {
            inner: InMemoryLedger::new(),
            poison: "BAD-1".to_string(),
        });
        let history = Arc::new(InMemoryHistory::new());
        let cache = Arc::new(PriceCache::new(
            Arc::new(InMemoryCacheBackend::new()),
            Duration::from_secs(1800),
        ));
        let pipeline = IngestPipeline::new(
            ledger.clone(),
            history.clone(),
            cache,
            Arc::new(ScriptedOracle::new(&[("BAD-1", 100.0), ("OK-1", 100.0)])),
            VerifyPolicy::default(),
            200,
        );

        let summary = pipeline
            .ingest(&[obs("BAD-1", 90.0), obs("OK-1", 90.0)], "test")
            .await
            .unwrap();

        // The failed item is not counted stored, the rest of the batch ran,
        // and both verified observations still reached the history log.
        assert_eq!(summary.stored, 1);
        assert_eq!(summary.rejected, 0);
        assert!(ledger.read(&pid("OK-1")).await.unwrap().is_some());
        assert_eq!(history.entries().await.len(), 2);
    }
}
