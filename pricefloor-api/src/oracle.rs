//! Verification Oracle Adapter
//!
//! Untrusted observations only reach the ledger after a check against the
//! authoritative upstream product API. The adapter does one outbound HTTP
//! call per check, with a bounded timeout and no retries; batching and
//! backoff are the caller's concern.
//!
//! Every failure mode fails closed: an observation of unknown validity must
//! never corrupt the ledger.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use pricefloor_core::{OracleError, PricefloorError, PricefloorResult, ProductId};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Upstream oracle configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL of the upstream product API.
    pub base_url: String,
    /// Hard timeout for one verification call. On timeout the observation
    /// is rejected, never retried here.
    pub timeout: Duration,
    /// User-Agent sent with every verification call.
    pub user_agent: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ecapi-cdn.example.com/prodapi/v2".to_string(),
            timeout: Duration::from_secs(5),
            user_agent: "pricefloor-verify/0.1".to_string(),
        }
    }
}

impl OracleConfig {
    /// Create OracleConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PRICEFLOOR_ORACLE_URL`: upstream base URL
    /// - `PRICEFLOOR_ORACLE_TIMEOUT_SECS`: request timeout (default: 5)
    /// - `PRICEFLOOR_ORACLE_USER_AGENT`: outbound User-Agent
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("PRICEFLOOR_ORACLE_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("PRICEFLOOR_ORACLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: std::env::var("PRICEFLOOR_ORACLE_USER_AGENT")
                .unwrap_or(defaults.user_agent),
        }
    }
}

// ============================================================================
// ORACLE TRAIT AND HTTP IMPLEMENTATION
// ============================================================================

/// The authoritative "current official price" lookup.
///
/// `Ok(None)` means the oracle answered but knows no price for the product
/// (unknown product). Errors cover outage, timeout, non-success status, and
/// malformed bodies; the gate treats all of them as not-accepted.
#[async_trait]
pub trait VerificationOracle: Send + Sync {
    async fn official_price(&self, product_id: &ProductId) -> Result<Option<f64>, OracleError>;
}

/// One entry of the upstream product API response array.
#[derive(Debug, Deserialize)]
struct OracleEntry {
    price: Option<f64>,
}

/// Production [`VerificationOracle`] over the upstream HTTP API.
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOracle {
    /// Build the oracle client. The timeout is baked into the reqwest
    /// client so every call is bounded.
    pub fn new(config: &OracleConfig) -> PricefloorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                PricefloorError::from(OracleError::Unreachable {
                    reason: format!("failed to build oracle HTTP client: {e}"),
                })
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VerificationOracle for HttpOracle {
    async fn official_price(&self, product_id: &ProductId) -> Result<Option<f64>, OracleError> {
        let url = format!("{}/prod/{}", self.base_url, product_id);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout
            } else {
                OracleError::Unreachable {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
            });
        }

        let entries: Vec<OracleEntry> = response.json().await.map_err(|e| {
            OracleError::MalformedResponse {
                reason: e.to_string(),
            }
        })?;

        Ok(entries.first().and_then(|entry| entry.price))
    }
}

// ============================================================================
// VERIFICATION GATE
// ============================================================================

/// The anti-poisoning gate applied to every observation before it may touch
/// the ledger.
///
/// A reported price is accepted iff the oracle knows a finite non-negative
/// official price `o` and `reported >= o * min_ratio`. The default ratio of
/// 0.5 tolerates legitimate clearance pricing while blocking gross
/// poisoning.
#[derive(Debug, Clone, Copy)]
pub struct VerifyPolicy {
    pub min_ratio: f64,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self { min_ratio: 0.5 }
    }
}

impl VerifyPolicy {
    pub fn new(min_ratio: f64) -> Self {
        Self { min_ratio }
    }

    /// Decide whether `reported` is plausible for `product_id`.
    ///
    /// Fail closed: oracle outage, timeout, unknown product, and malformed
    /// official prices all answer `false`.
    pub async fn verify(
        &self,
        oracle: &dyn VerificationOracle,
        product_id: &ProductId,
        reported: f64,
    ) -> bool {
        match oracle.official_price(product_id).await {
            Ok(Some(official)) => {
                if !official.is_finite() || official < 0.0 {
                    tracing::warn!(%product_id, official, "oracle returned a malformed official price");
                    return false;
                }
                reported >= official * self.min_ratio
            }
            Ok(None) => {
                tracing::debug!(%product_id, "oracle knows no price for product");
                false
            }
            Err(err) => {
                tracing::warn!(%product_id, %err, "verification call failed, rejecting observation");
                false
            }
        }
    }
}
