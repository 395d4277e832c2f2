//! Pricefloor API - Edge Service for the Verified Lowest-Price Ledger
//!
//! This crate is the edge half of the crowdsourced price-check system: it
//! accepts untrusted price observations, gates them against the upstream
//! verification oracle, merges them into the PostgreSQL ledger, and serves
//! lowest-price lookups through a cache-aside layer with explicit
//! invalidation.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod openapi;
pub mod oracle;
pub mod routes;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use ingest::IngestPipeline;
pub use openapi::ApiDoc;
pub use oracle::{HttpOracle, OracleConfig, VerificationOracle, VerifyPolicy};
pub use routes::create_api_router;
pub use state::AppState;
