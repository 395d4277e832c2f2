//! Wire types for the REST surface.
//!
//! All responses carry an explicit `ok` flag and camelCase field names, the
//! shapes the scanning clients already speak. Absent prices are serialized
//! as `null` fields, never omitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use pricefloor_core::{Observation, PriceRecord};

// ============================================================================
// READ PATH
// ============================================================================

/// Query parameters for `GET /lowest`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LowestQuery {
    /// Product identifier to look up.
    pub prod_id: Option<String>,
}

/// JSON body for `POST /lowest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowestBody {
    pub prod_id: Option<String>,
}

/// Lowest-price lookup response. `minPrice`/`updatedAt` are null when the
/// product has no ledger entry yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowestResponse {
    pub ok: bool,
    pub prod_id: String,
    pub min_price: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LowestResponse {
    pub fn known(record: &PriceRecord) -> Self {
        Self {
            ok: true,
            prod_id: record.product_id.to_string(),
            min_price: Some(record.min_price),
            updated_at: Some(record.updated_at),
        }
    }

    pub fn unknown(prod_id: impl Into<String>) -> Self {
        Self {
            ok: true,
            prod_id: prod_id.into(),
            min_price: None,
            updated_at: None,
        }
    }
}

/// JSON body for `POST /lowest/batch`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub prod_ids: Vec<String>,
}

/// One entry of a batch lookup response, mirroring the caller's id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub prod_id: String,
    pub min_price: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BatchItem {
    pub fn known(prod_id: impl Into<String>, record: &PriceRecord) -> Self {
        Self {
            prod_id: prod_id.into(),
            min_price: Some(record.min_price),
            updated_at: Some(record.updated_at),
        }
    }

    pub fn unknown(prod_id: impl Into<String>) -> Self {
        Self {
            prod_id: prod_id.into(),
            min_price: None,
            updated_at: None,
        }
    }
}

/// Batch lookup response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchResponse {
    pub ok: bool,
    pub items: Vec<BatchItem>,
}

// ============================================================================
// INGESTION
// ============================================================================

/// JSON body for `POST /ingest`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestRequest {
    /// Price observations, at most the configured batch maximum (200).
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<Observation>,
}

/// Ingestion outcome counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub ok: bool,
    /// Raw item count of the submitted batch.
    pub count: usize,
    /// Verified observations whose merge statement completed.
    pub stored: usize,
    /// Observations rejected by the verification gate.
    pub rejected: usize,
    /// Observations dropped by shape validation.
    pub skipped: usize,
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// `GET /health` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
}

/// `GET /stats` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub ok: bool,
    pub count: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// `GET /snapshot` response: the full ledger dump for client bulk caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub ok: bool,
    /// Export wall-clock time, not the ledger's latest update.
    pub as_of: DateTime<Utc>,
    pub prices: BTreeMap<String, f64>,
}
