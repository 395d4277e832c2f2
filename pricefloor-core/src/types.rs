//! Domain types for the lowest-price ledger.
//!
//! The central types are [`ProductId`] (a pattern-validated retail product
//! identifier) and [`PriceRecord`] (one ledger row: the minimum verified
//! price ever accepted for a product). Everything else is transient input
//! or aggregate output built around those two.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Allowed product identifier pattern: uppercase alphanumeric plus hyphen.
///
/// Retail product ids are normalized to this convention by the reporting
/// clients; anything else is an invalid observation, not a case to fold.
static PRODUCT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9-]+$").expect("product id pattern is valid"));

// ============================================================================
// PRODUCT ID
// ============================================================================

/// A validated retail product identifier.
///
/// Construction via [`ProductId::parse`] is the single normalization point:
/// input is trimmed and checked against the identifier pattern. Once a
/// `ProductId` exists it is known to be a non-empty `[A-Z0-9-]+` string,
/// which is what the ledger key column and cache keys rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Parse a raw, untrusted identifier.
    ///
    /// Leading/trailing whitespace is trimmed before validation.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyProductId`] for empty (or
    /// whitespace-only) input and [`ValidationError::InvalidProductId`]
    /// when the trimmed value does not match the allowed pattern.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyProductId);
        }
        if !PRODUCT_ID_PATTERN.is_match(trimmed) {
            return Err(ValidationError::InvalidProductId {
                id: trimmed.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// View the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier and return the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// LEDGER ROW
// ============================================================================

/// One row of the lowest-price ledger.
///
/// Created on the first accepted observation for a product, mutated only by
/// the upsert-min merge, never deleted. `min_price` is monotonically
/// non-increasing over the record's lifetime; `updated_at` moves only when
/// an observation actually lowered (or first established) the minimum, so
/// staleness can be judged from `updated_at` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product_id: ProductId,
    pub min_price: f64,
    pub updated_at: DateTime<Utc>,
}

/// Result of one upsert-min merge against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// True when the incoming price created the row or strictly lowered the
    /// stored minimum. False for no-op merges (price >= stored minimum).
    pub updated: bool,
}

/// Aggregate ledger figures, eventually consistent with concurrent writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub count: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

// ============================================================================
// TRANSIENT INPUT / AUDIT OUTPUT
// ============================================================================

/// A single untrusted price observation as reported by a scanning client.
///
/// `prod_id` and `price` are raw and unvalidated here; the ingestion
/// pipeline performs shape validation and the verification gate. The
/// optional metadata is reporter context that never influences the merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Raw product identifier. Absent on the wire deserializes to an empty
    /// string, which shape validation then skips.
    #[serde(default)]
    pub prod_id: String,
    /// Reported price. Numbers and numeric strings are accepted; absent
    /// deserializes to 0.0 and any other shape to NaN, both of which fall
    /// outside the valid range and are skipped by shape validation.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Coercing price deserializer: reporting clients are loose about number
/// typing, so a numeric string counts as a number. Anything non-coercible
/// becomes NaN — a per-item skip, never a batch-level parse failure.
fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => n,
        RawPrice::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        RawPrice::Other(_) => f64::NAN,
    })
}

/// One append-only audit row: an accepted observation as recorded.
///
/// No uniqueness constraint and no merge; the history log is a superset
/// signal and is never used to recompute the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub product_id: ProductId,
    pub price: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Per-batch ingestion outcome counters.
///
/// `received` mirrors the raw item count. The three outcome counters are
/// disjoint: an item is `skipped` (failed shape validation), `rejected`
/// (failed the verification gate), or it reached the merge; `stored` counts
/// items whose merge statement completed, including no-op merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub received: usize,
    pub stored: usize,
    pub rejected: usize,
    pub skipped: usize,
}
