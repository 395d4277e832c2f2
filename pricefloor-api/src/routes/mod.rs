//! REST API Routes Module
//!
//! All route handlers for the edge service, organized by operation:
//! liveness, aggregate stats, snapshot export, lowest-price lookups
//! (single and batch), and ingestion. Every response carries permissive
//! CORS headers; unknown routes answer with the uniform 404 envelope.

pub mod health;
pub mod ingest;
pub mod lowest;
pub mod snapshot;
pub mod stats;

use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Fallback for unknown routes: uniform `{ok:false, error}` with 404.
async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

/// Permissive cross-origin policy: the scanning clients run inside browser
/// pages on arbitrary retail origins.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the complete API router over the given application state.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/stats", get(stats::stats))
        .route("/snapshot", get(snapshot::snapshot))
        .route("/lowest", get(lowest::lowest_get).post(lowest::lowest_post))
        .route("/lowest/batch", post(lowest::lowest_batch))
        .route("/ingest", post(ingest::ingest))
        .route("/openapi.json", get(openapi_json))
        .fallback(not_found)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
