//! Error types for pricefloor operations

use thiserror::Error;

/// Per-item and batch-level input validation errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Product id is empty")]
    EmptyProductId,

    #[error("Product id {id:?} does not match the allowed pattern [A-Z0-9-]+")]
    InvalidProductId { id: String },

    #[error("Price {price} is not a finite positive number")]
    InvalidPrice { price: f64 },

    #[error("Batch of {len} items exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Required field missing: {field}")]
    MissingField { field: String },
}

/// Storage layer errors (ledger, history log, cache backends).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Failed to acquire connection: {reason}")]
    Pool { reason: String },

    #[error("Query failed: {reason}")]
    Query { reason: String },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Verification oracle errors.
///
/// Every variant is treated as "not accepted" by the verification gate;
/// these exist so callers can log the distinct failure modes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Oracle returned non-success status {status}")]
    Status { status: u16 },

    #[error("Oracle response malformed: {reason}")]
    MalformedResponse { reason: String },

    #[error("Oracle request timed out")]
    Timeout,
}

/// Top-level error type composing the layer-specific enums.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PricefloorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Result type alias used throughout the workspace.
pub type PricefloorResult<T> = Result<T, PricefloorError>;
