//! Database Connection Pool Module
//!
//! PostgreSQL-backed implementation of the ledger and history log, using
//! deadpool-postgres for pooling. The upsert-min merge is a single
//! `INSERT .. ON CONFLICT DO UPDATE .. WHERE` statement, which makes the
//! row-level compare-and-replace-if-lower atomic inside PostgreSQL — the
//! sole serialization point for concurrent writers, no external locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::collections::HashMap;
use std::time::Duration;
use tokio_postgres::NoTls;

use pricefloor_core::{
    HistoryEntry, LedgerStats, MergeOutcome, PriceRecord, PricefloorError, PricefloorResult,
    ProductId, StorageError,
};
use pricefloor_storage::{HistoryLog, LedgerStore};

/// Upper bound on ids per `read_many` query. A storage engine constraint
/// (bind parameter array sizing), hidden from callers by chunking.
const READ_CHUNK: usize = 100;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "pricefloor".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PRICEFLOOR_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PRICEFLOOR_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("PRICEFLOOR_DB_NAME")
                .unwrap_or_else(|_| "pricefloor".to_string()),
            user: std::env::var("PRICEFLOOR_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PRICEFLOOR_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PRICEFLOOR_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("PRICEFLOOR_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> PricefloorResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
            PricefloorError::from(StorageError::Pool {
                reason: format!("Failed to create pool: {}", e),
            })
        })?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT
// ============================================================================

/// Database client wrapping a connection pool; implements [`LedgerStore`]
/// and [`HistoryLog`] over the two persisted tables.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> PricefloorResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> PricefloorResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            tracing::error!(error = %e, "connection pool error");
            StorageError::Pool {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Create the ledger and history tables if they do not exist.
    pub async fn ensure_schema(&self) -> PricefloorResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(
            "CREATE TABLE IF NOT EXISTS lowest_prices (
                 prod_id    TEXT PRIMARY KEY,
                 min_price  DOUBLE PRECISION NOT NULL,
                 updated_at TIMESTAMPTZ NOT NULL
             );
             CREATE TABLE IF NOT EXISTS price_history (
                 prod_id     TEXT NOT NULL,
                 price       DOUBLE PRECISION NOT NULL,
                 recorded_at TIMESTAMPTZ NOT NULL
             );",
        )
        .await
        .map_err(query_error)
    }
}

fn query_error(e: tokio_postgres::Error) -> PricefloorError {
    tracing::error!(error = %e, "database query failed");
    StorageError::Query {
        reason: e.to_string(),
    }
    .into()
}

fn record_from_row(row: &tokio_postgres::Row) -> PricefloorResult<PriceRecord> {
    let raw_id: String = row.get("prod_id");
    let product_id = ProductId::parse(&raw_id).map_err(|e| {
        PricefloorError::from(StorageError::Query {
            reason: format!("corrupt ledger row {raw_id:?}: {e}"),
        })
    })?;
    Ok(PriceRecord {
        product_id,
        min_price: row.get("min_price"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl LedgerStore for DbClient {
    async fn upsert_min(
        &self,
        product_id: &ProductId,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> PricefloorResult<MergeOutcome> {
        let conn = self.get_conn().await?;
        // The WHERE clause makes the no-op case visible: RETURNING only
        // yields a row when the insert happened or the update fired.
        let rows = conn
            .query(
                "INSERT INTO lowest_prices (prod_id, min_price, updated_at)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (prod_id) DO UPDATE
                 SET min_price = EXCLUDED.min_price,
                     updated_at = EXCLUDED.updated_at
                 WHERE EXCLUDED.min_price < lowest_prices.min_price
                 RETURNING min_price",
                &[&product_id.as_str(), &price, &timestamp],
            )
            .await
            .map_err(query_error)?;

        Ok(MergeOutcome {
            updated: !rows.is_empty(),
        })
    }

    async fn read(&self, product_id: &ProductId) -> PricefloorResult<Option<PriceRecord>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT prod_id, min_price, updated_at FROM lowest_prices WHERE prod_id = $1",
                &[&product_id.as_str()],
            )
            .await
            .map_err(query_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn read_many(
        &self,
        product_ids: &[ProductId],
    ) -> PricefloorResult<HashMap<ProductId, PriceRecord>> {
        let conn = self.get_conn().await?;
        let mut found = HashMap::with_capacity(product_ids.len());

        for chunk in product_ids.chunks(READ_CHUNK) {
            let ids: Vec<&str> = chunk.iter().map(ProductId::as_str).collect();
            let rows = conn
                .query(
                    "SELECT prod_id, min_price, updated_at
                     FROM lowest_prices WHERE prod_id = ANY($1)",
                    &[&ids],
                )
                .await
                .map_err(query_error)?;

            for row in &rows {
                let record = record_from_row(row)?;
                found.insert(record.product_id.clone(), record);
            }
        }

        Ok(found)
    }

    async fn stats(&self) -> PricefloorResult<LedgerStats> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) AS c, MAX(updated_at) AS last_updated FROM lowest_prices",
                &[],
            )
            .await
            .map_err(query_error)?;

        Ok(LedgerStats {
            count: row.get("c"),
            last_updated: row.get("last_updated"),
        })
    }

    async fn scan_all(&self) -> PricefloorResult<Vec<(ProductId, f64)>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query("SELECT prod_id, min_price FROM lowest_prices", &[])
            .await
            .map_err(query_error)?;

        let mut all = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw_id: String = row.get("prod_id");
            let product_id = ProductId::parse(&raw_id).map_err(|e| {
                PricefloorError::from(StorageError::Query {
                    reason: format!("corrupt ledger row {raw_id:?}: {e}"),
                })
            })?;
            all.push((product_id, row.get("min_price")));
        }
        Ok(all)
    }
}

#[async_trait]
impl HistoryLog for DbClient {
    async fn append(&self, entry: HistoryEntry) -> PricefloorResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO price_history (prod_id, price, recorded_at) VALUES ($1, $2, $3)",
            &[&entry.product_id.as_str(), &entry.price, &entry.recorded_at],
        )
        .await
        .map_err(query_error)?;
        Ok(())
    }
}
