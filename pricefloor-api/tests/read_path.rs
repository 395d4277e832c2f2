//! Read-path scenarios over the real router: cache-aside lookups, cache
//! headers, batch order preservation, snapshot, stats, and liveness.

mod common;

use common::{build_app, get, header, post_json};

use axum::http::StatusCode;
use serde_json::json;

fn observation(prod_id: &str, price: f64) -> serde_json::Value {
    json!({ "prodId": prod_id, "price": price })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = build_app(&[]);
    let (status, _, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn lowest_requires_a_prod_id() {
    let app = build_app(&[]);

    let (status, _, body) = get(&app.router, "/lowest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);

    let (status, _, body) = get(&app.router, "/lowest?prodId=not%20valid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

/// A query string the extractor cannot parse still answers with the
/// uniform error envelope, not a bare-text rejection.
#[tokio::test]
async fn malformed_query_yields_the_error_envelope() {
    let app = build_app(&[]);

    let (status, _, body) = get(&app.router, "/lowest?prodId=A-1&prodId=B-2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().is_some());
}

/// Unknown products answer with nulls and are never cached: a second read
/// is still a miss, so a later ingest becomes visible immediately.
#[tokio::test]
async fn unknown_product_is_not_negatively_cached() {
    let app = build_app(&[("NEW-1", 100.0)]);

    let (status, headers, body) = get(&app.router, "/lowest?prodId=NEW-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["minPrice"].is_null());
    assert!(body["updatedAt"].is_null());
    assert_eq!(header(&headers, "cache-control"), Some("no-store"));
    assert_eq!(header(&headers, "x-cache"), Some("MISS"));

    let (_, headers, _) = get(&app.router, "/lowest?prodId=NEW-1").await;
    assert_eq!(header(&headers, "x-cache"), Some("MISS"));

    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [observation("NEW-1", 70.0)] }),
    )
    .await;

    let (_, _, body) = get(&app.router, "/lowest?prodId=NEW-1").await;
    assert_eq!(body["minPrice"], 70.0);
}

/// Known products go MISS then HIT, with a cacheable response.
#[tokio::test]
async fn known_product_populates_the_cache() {
    let app = build_app(&[("HOT-1", 100.0)]);
    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [observation("HOT-1", 60.0)] }),
    )
    .await;

    let (_, headers, body) = get(&app.router, "/lowest?prodId=HOT-1").await;
    assert_eq!(header(&headers, "x-cache"), Some("MISS"));
    assert_eq!(header(&headers, "cache-control"), Some("public, max-age=1800"));
    assert_eq!(body["minPrice"], 60.0);

    let (_, headers, body) = get(&app.router, "/lowest?prodId=HOT-1").await;
    assert_eq!(header(&headers, "x-cache"), Some("HIT"));
    assert_eq!(body["minPrice"], 60.0);
}

/// Ingesting a lower price evicts the cached entry, so the next read sees
/// the new floor instead of serving the stale hit.
#[tokio::test]
async fn ingest_invalidates_a_cached_read()  {
    let app = build_app(&[("HOT-2", 100.0)]);
    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [observation("HOT-2", 60.0)] }),
    )
    .await;

    // Warm the cache.
    get(&app.router, "/lowest?prodId=HOT-2").await;
    let (_, headers, _) = get(&app.router, "/lowest?prodId=HOT-2").await;
    assert_eq!(header(&headers, "x-cache"), Some("HIT"));

    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [observation("HOT-2", 50.0)] }),
    )
    .await;

    let (_, headers, body) = get(&app.router, "/lowest?prodId=HOT-2").await;
    assert_eq!(header(&headers, "x-cache"), Some("MISS"));
    assert_eq!(body["minPrice"], 50.0);
}

/// POST /lowest reads the ledger directly and marks itself BYPASS.
#[tokio::test]
async fn post_lowest_bypasses_the_cache() {
    let app = build_app(&[("POST-1", 100.0)]);
    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [observation("POST-1", 80.0)] }),
    )
    .await;

    let (status, headers, body) =
        post_json(&app.router, "/lowest", json!({ "prodId": "POST-1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache"), Some("BYPASS"));
    assert_eq!(body["minPrice"], 80.0);
}

/// Batch output mirrors request order, with unknown and malformed ids as
/// null-price entries rather than omissions.
#[tokio::test]
async fn batch_preserves_request_order() {
    let app = build_app(&[("A-1", 100.0)]);
    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [observation("A-1", 42.0)] }),
    )
    .await;

    let (status, _, body) = post_json(
        &app.router,
        "/lowest/batch",
        json!({ "prodIds": ["B-1", "A-1", "bad id", "A-1"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let items = body["items"].as_array().expect("items array");
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["prodId"], "B-1");
    assert!(items[0]["minPrice"].is_null());
    assert_eq!(items[1]["prodId"], "A-1");
    assert_eq!(items[1]["minPrice"], 42.0);
    assert!(items[2]["minPrice"].is_null());
    // Duplicate ids resolve once but appear per request slot.
    assert_eq!(items[3]["minPrice"], 42.0);
}

#[tokio::test]
async fn batch_over_the_limit_is_rejected() {
    let app = build_app(&[]);
    let ids: Vec<String> = (0..201).map(|i| format!("ID-{i}")).collect();

    let (status, _, body) =
        post_json(&app.router, "/lowest/batch", json!({ "prodIds": ids })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn stats_counts_distinct_products() {
    let app = build_app(&[("S-1", 100.0), ("S-2", 100.0)]);
    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [
            observation("S-1", 50.0),
            observation("S-2", 60.0),
            observation("S-1", 55.0),
        ] }),
    )
    .await;

    let (status, _, body) = get(&app.router, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["count"], 2);
    assert!(body["lastUpdated"].is_string());
}

/// Snapshot exports every ledger row with a long shared-cache lifetime.
#[tokio::test]
async fn snapshot_exports_the_whole_ledger() {
    let app = build_app(&[("S-1", 100.0), ("S-2", 100.0)]);
    post_json(
        &app.router,
        "/ingest",
        json!({ "items": [observation("S-1", 50.0), observation("S-2", 60.0)] }),
    )
    .await;

    let (status, headers, body) = get(&app.router, "/snapshot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        header(&headers, "cache-control"),
        Some("public, max-age=3600")
    );
    assert!(body["asOf"].is_string());
    assert_eq!(body["prices"]["S-1"], 50.0);
    assert_eq!(body["prices"]["S-2"], 60.0);

    let (_, _, empty) = get(&build_app(&[]).router, "/snapshot").await;
    assert_eq!(empty["prices"], json!({}));
}

#[tokio::test]
async fn unknown_route_yields_the_error_envelope() {
    let app = build_app(&[]);
    let (status, _, body) = get(&app.router, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
}
