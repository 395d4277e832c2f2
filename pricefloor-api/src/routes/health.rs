//! Liveness endpoint. No storage access, no authentication.

use axum::Json;

use crate::types::HealthResponse;

/// GET /health - liveness only
#[utoipa::path(
    get,
    path = "/health",
    tag = "Service",
    responses(
        (status = 200, description = "Service is responding", body = HealthResponse),
    ),
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
