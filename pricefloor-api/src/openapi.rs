//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::error::ErrorEnvelope;
use crate::types::{
    BatchItem, BatchRequest, BatchResponse, HealthResponse, IngestRequest, IngestResponse,
    LowestBody, LowestResponse, SnapshotResponse, StatsResponse,
};

/// OpenAPI documentation for the pricefloor edge service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pricefloor API",
        description = "Crowdsourced verified lowest-price ledger",
    ),
    paths(
        crate::routes::health::health,
        crate::routes::stats::stats,
        crate::routes::snapshot::snapshot,
        crate::routes::lowest::lowest_get,
        crate::routes::lowest::lowest_post,
        crate::routes::lowest::lowest_batch,
        crate::routes::ingest::ingest,
    ),
    components(schemas(
        HealthResponse,
        StatsResponse,
        SnapshotResponse,
        LowestBody,
        LowestResponse,
        BatchRequest,
        BatchItem,
        BatchResponse,
        IngestRequest,
        IngestResponse,
        ErrorEnvelope,
    )),
    tags(
        (name = "Service", description = "Liveness and aggregates"),
        (name = "Read path", description = "Cache-aside lowest-price lookups"),
        (name = "Ingestion", description = "Verification-gated observation intake"),
    )
)]
pub struct ApiDoc;
