//! Lowest-price lookups, single and batch.
//!
//! The single GET path is the cache-aside read: probe the cache with the
//! canonical product key, fall through to the ledger on miss, and populate
//! the cache only when a price is known. Unknown products are answered with
//! nulls and `Cache-Control: no-store` — "not yet known" is expected to
//! change soon, and a negative cache entry would stall discovery.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::{HashMap, HashSet};

use pricefloor_core::{PriceRecord, ProductId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{BatchItem, BatchRequest, BatchResponse, LowestBody, LowestQuery, LowestResponse};

static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// GET /lowest?prodId=... - cache-aside single lookup
#[utoipa::path(
    get,
    path = "/lowest",
    tag = "Read path",
    params(LowestQuery),
    responses(
        (status = 200, description = "Lowest known price, null fields when unknown", body = LowestResponse),
        (status = 400, description = "Missing or malformed prodId", body = crate::error::ErrorEnvelope),
    ),
)]
pub async fn lowest_get(
    State(state): State<AppState>,
    query: Result<Query<LowestQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) =
        query.map_err(|e| ApiError::invalid_input(format!("Invalid query: {e}")))?;
    let product_id = parse_prod_id(query.prod_id.as_deref())?;

    let ledger = state.ledger.clone();
    let fetch_id = product_id.clone();
    let outcome = state
        .cache
        .get_or_populate(&product_id, move || async move {
            ledger.read(&fetch_id).await
        })
        .await?;

    let x_cache = if outcome.from_cache { "HIT" } else { "MISS" };
    Ok(respond(&state, &product_id, outcome.record.as_ref(), x_cache))
}

/// POST /lowest - single lookup with the id in the JSON body
///
/// Bypasses the cacheable path entirely, mirroring the edge behavior where
/// only GET responses participate in HTTP caching.
#[utoipa::path(
    post,
    path = "/lowest",
    tag = "Read path",
    request_body = LowestBody,
    responses(
        (status = 200, description = "Lowest known price, null fields when unknown", body = LowestResponse),
        (status = 400, description = "Missing or malformed prodId", body = crate::error::ErrorEnvelope),
    ),
)]
pub async fn lowest_post(
    State(state): State<AppState>,
    payload: Result<Json<LowestBody>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = payload.map_err(|e| ApiError::invalid_input(format!("Invalid payload: {e}")))?;
    let product_id = parse_prod_id(body.prod_id.as_deref())?;

    let record = state.ledger.read(&product_id).await?;
    Ok(respond(&state, &product_id, record.as_ref(), "BYPASS"))
}

/// POST /lowest/batch - order-preserving bulk lookup
///
/// Ids are deduplicated before resolution; cache misses are resolved with a
/// single chunked `read_many` and written back individually under the same
/// TTL policy as the single-read path. Output order mirrors the caller's
/// original (pre-deduplication) order, with absent entries as null-price
/// items, never omitted.
#[utoipa::path(
    post,
    path = "/lowest/batch",
    tag = "Read path",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "Per-id results in request order", body = BatchResponse),
        (status = 400, description = "Malformed payload or oversize batch", body = crate::error::ErrorEnvelope),
    ),
)]
pub async fn lowest_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_input(format!("Invalid payload: {e}")))?;
    if req.prod_ids.len() > state.config.max_batch {
        return Err(ApiError::batch_too_large(
            req.prod_ids.len(),
            state.config.max_batch,
        ));
    }

    // Ids that fail the pattern cannot exist in the ledger; they resolve to
    // null entries rather than failing the whole call.
    let parsed: Vec<Option<ProductId>> = req
        .prod_ids
        .iter()
        .map(|raw| ProductId::parse(raw).ok())
        .collect();

    let mut seen = HashSet::new();
    let unique: Vec<ProductId> = parsed
        .iter()
        .flatten()
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect();

    let mut resolved: HashMap<ProductId, PriceRecord> = HashMap::new();
    let mut misses: Vec<ProductId> = Vec::new();
    for id in &unique {
        match state.cache.lookup(id).await {
            Some(record) => {
                resolved.insert(id.clone(), record);
            }
            None => misses.push(id.clone()),
        }
    }

    if !misses.is_empty() {
        let fetched = state.ledger.read_many(&misses).await?;
        for (id, record) in fetched {
            state.cache.store(&record).await;
            resolved.insert(id, record);
        }
    }

    let items = req
        .prod_ids
        .iter()
        .zip(parsed)
        .map(|(raw, maybe)| match maybe.and_then(|id| resolved.get(&id).cloned()) {
            Some(record) => BatchItem::known(raw.clone(), &record),
            None => BatchItem::unknown(raw.clone()),
        })
        .collect();

    Ok(Json(BatchResponse { ok: true, items }))
}

fn parse_prod_id(raw: Option<&str>) -> ApiResult<ProductId> {
    let raw = raw.unwrap_or("");
    if raw.trim().is_empty() {
        return Err(ApiError::missing_field("prodId"));
    }
    ProductId::parse(raw).map_err(|_| ApiError::invalid_format("prodId", "[A-Z0-9-]+"))
}

fn respond(
    state: &AppState,
    product_id: &ProductId,
    record: Option<&PriceRecord>,
    x_cache: &str,
) -> Response {
    let (body, cache_control) = match record {
        Some(record) => (
            LowestResponse::known(record),
            format!("public, max-age={}", state.config.cache_ttl.as_secs()),
        ),
        None => (
            LowestResponse::unknown(product_id.as_str()),
            "no-store".to_string(),
        ),
    };

    (
        [
            (header::CACHE_CONTROL, cache_control),
            (X_CACHE.clone(), x_cache.to_string()),
        ],
        Json(body),
    )
        .into_response()
}
