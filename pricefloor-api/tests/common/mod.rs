//! Shared harness for router-level tests: the real API router over
//! in-memory storage and a scripted verification oracle.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use pricefloor_api::{create_api_router, ApiConfig, AppState, VerificationOracle};
use pricefloor_core::{OracleError, ProductId};
use pricefloor_storage::{InMemoryCacheBackend, InMemoryHistory, InMemoryLedger};

/// Oracle scripted per product id, with a switchable outage mode.
pub struct ScriptedOracle {
    official: Mutex<HashMap<String, f64>>,
    outage: AtomicBool,
}

impl ScriptedOracle {
    pub fn new(entries: &[(&str, f64)]) -> Self {
        Self {
            official: Mutex::new(
                entries
                    .iter()
                    .map(|(id, price)| (id.to_string(), *price))
                    .collect(),
            ),
            outage: AtomicBool::new(false),
        }
    }

    /// Change the official price the oracle reports for `prod_id`.
    pub fn set_official(&self, prod_id: &str, price: f64) {
        self.official
            .lock()
            .expect("oracle lock")
            .insert(prod_id.to_string(), price);
    }

    /// Simulate an upstream outage: every call errors until cleared.
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl VerificationOracle for ScriptedOracle {
    async fn official_price(&self, product_id: &ProductId) -> Result<Option<f64>, OracleError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(OracleError::Unreachable {
                reason: "scripted outage".to_string(),
            });
        }
        Ok(self
            .official
            .lock()
            .expect("oracle lock")
            .get(product_id.as_str())
            .copied())
    }
}

/// The wired-up service under test plus handles into its collaborators.
pub struct TestApp {
    pub router: Router,
    pub ledger: Arc<InMemoryLedger>,
    pub history: Arc<InMemoryHistory>,
    pub oracle: Arc<ScriptedOracle>,
}

/// Build the real router over in-memory storage with default policy
/// (200-item batches, 0.5 verification ratio, 1800s cache TTL).
pub fn build_app(official: &[(&str, f64)]) -> TestApp {
    let ledger = Arc::new(InMemoryLedger::new());
    let history = Arc::new(InMemoryHistory::new());
    let oracle = Arc::new(ScriptedOracle::new(official));

    let state = AppState::new(
        ledger.clone(),
        history.clone(),
        oracle.clone(),
        Arc::new(InMemoryCacheBackend::new()),
        ApiConfig::default(),
    );

    TestApp {
        router: create_api_router(state),
        ledger,
        history,
        oracle,
    }
}

/// One GET against the router; returns status, headers, and parsed body.
pub async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(router, request).await
}

/// One POST with a JSON body against the router.
pub async fn post_json(
    router: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("request");
    send(router, request).await
}

/// One POST with a raw (possibly malformed) body.
pub async fn post_raw(
    router: &Router,
    uri: &str,
    body: &'static str,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request");
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router never errors");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, headers, json)
}

/// Header accessor that tolerates absence.
pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
