//! Aggregate ledger statistics.

use axum::{extract::State, Json};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::StatsResponse;

/// GET /stats - ledger row count and most recent update
///
/// Eventually consistent with concurrent writers; good enough for
/// dashboards and client-side freshness heuristics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Service",
    responses(
        (status = 200, description = "Aggregate ledger figures", body = StatsResponse),
        (status = 500, description = "Ledger store failure", body = crate::error::ErrorEnvelope),
    ),
)]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.ledger.stats().await?;
    Ok(Json(StatsResponse {
        ok: true,
        count: stats.count,
        last_updated: stats.last_updated,
    }))
}
