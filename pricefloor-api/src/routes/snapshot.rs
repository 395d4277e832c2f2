//! Snapshot export: the full ledger dump for client bulk caching.

use axum::{extract::State, http::header, response::IntoResponse, response::Response, Json};
use chrono::Utc;
use std::collections::BTreeMap;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::SnapshotResponse;

/// Row count past which the unbounded export gets flagged in the logs.
/// The export is deliberately never truncated: a silently capped snapshot
/// would corrupt client bulk caches. Past this size the fix is an offloaded
/// dump (object storage + redirect), not pagination here.
const SNAPSHOT_WARN_ROWS: usize = 100_000;

/// GET /snapshot - full-table export, cacheable at the edge for a coarse
/// window independent of the per-product cache
///
/// Staleness is acceptable by design: the export only seeds client-local
/// caches that clients refresh periodically.
#[utoipa::path(
    get,
    path = "/snapshot",
    tag = "Read path",
    responses(
        (status = 200, description = "Full lowest-price dump", body = SnapshotResponse),
        (status = 500, description = "Ledger store failure", body = crate::error::ErrorEnvelope),
    ),
)]
pub async fn snapshot(State(state): State<AppState>) -> ApiResult<Response> {
    let all = state.ledger.scan_all().await?;

    if all.len() > SNAPSHOT_WARN_ROWS {
        tracing::warn!(
            rows = all.len(),
            "snapshot export has outgrown a single response"
        );
    }

    let prices: BTreeMap<String, f64> = all
        .into_iter()
        .map(|(product_id, min_price)| (product_id.into_string(), min_price))
        .collect();

    let body = SnapshotResponse {
        ok: true,
        as_of: Utc::now(),
        prices,
    };
    let cache_control = format!("public, max-age={}", state.config.snapshot_ttl.as_secs());

    Ok(([(header::CACHE_CONTROL, cache_control)], Json(body)).into_response())
}
