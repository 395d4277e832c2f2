//! Ingestion endpoint: verification-gated writes into the ledger.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::HeaderMap,
    Json,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{IngestRequest, IngestResponse};

/// POST /ingest - submit a batch of price observations
///
/// The handler only unwraps the envelope and the reporter address; batch
/// and per-item semantics live in [`IngestPipeline`](crate::ingest::IngestPipeline).
#[utoipa::path(
    post,
    path = "/ingest",
    tag = "Ingestion",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Batch processed; counters per outcome", body = IngestResponse),
        (status = 400, description = "Malformed payload or oversize batch", body = crate::error::ErrorEnvelope),
    ),
)]
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<Json<IngestResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_input(format!("Invalid payload: {e}")))?;

    let reporter = reporter_addr(&headers);
    let summary = state.pipeline.ingest(&req.items, &reporter).await?;

    Ok(Json(IngestResponse {
        ok: true,
        count: summary.received,
        stored: summary.stored,
        rejected: summary.rejected,
        skipped: summary.skipped,
    }))
}

/// Best-effort reporter address for rejection logging. Logging only; there
/// is no per-reporter rate limiting and no authentication.
fn reporter_addr(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "0.0.0.0".to_string())
}
