//! Error Types for the Pricefloor API
//!
//! Defines the API-layer error type and its mapping onto the uniform
//! `{ok:false, error}` JSON envelope. Every outward error response is
//! well-formed JSON with an explicit `ok` flag; nothing in this core is
//! fatal to the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use pricefloor_core::{PricefloorError, StorageError, ValidationError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each code maps to a specific HTTP status code. The wire envelope carries
/// only the message; the code drives the status and the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Client Errors (400, 404)
    // ========================================================================
    /// Request body or parameters are malformed
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field format is incorrect
    InvalidFormat,

    /// Batch exceeds the maximum item count
    BatchTooLarge,

    /// Unknown route
    NotFound,

    // ========================================================================
    // Server Errors (500, 503, 504)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Ledger store operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Operation timed out
    Timeout,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidFormat
            | ErrorCode::BatchTooLarge => StatusCode::BAD_REQUEST,

            ErrorCode::NotFound => StatusCode::NOT_FOUND,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error for API operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message, surfaced in the `error` field
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Missing required field '{}'", field),
        )
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create a BatchTooLarge error.
    pub fn batch_too_large(len: usize, max: usize) -> Self {
        Self::new(
            ErrorCode::BatchTooLarge,
            format!("Too many items: {} exceeds the maximum of {}", len, max),
        )
    }

    /// Create a NotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a DatabaseError.
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create a ServiceUnavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// WIRE ENVELOPE
// ============================================================================

/// The uniform error envelope: `{"ok": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: String,
}

/// Implement IntoResponse for ApiError to enable automatic error handling
/// in Axum handlers returning `ApiResult<T>`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorEnvelope {
            ok: false,
            error: self.message,
        });
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Map domain errors onto API errors.
///
/// Per-item validation and oracle failures never reach this path (the
/// ingestion pipeline counts them instead); what arrives here is
/// batch-level validation and store/infrastructure failure.
impl From<PricefloorError> for ApiError {
    fn from(err: PricefloorError) -> Self {
        match err {
            PricefloorError::Validation(v) => match v {
                ValidationError::BatchTooLarge { len, max } => ApiError::batch_too_large(len, max),
                ValidationError::EmptyProductId => ApiError::missing_field("prodId"),
                ValidationError::InvalidProductId { .. } => {
                    ApiError::invalid_format("prodId", "[A-Z0-9-]+")
                }
                ValidationError::InvalidPrice { .. } => {
                    ApiError::invalid_input("price must be a finite positive number")
                }
                ValidationError::MissingField { field } => ApiError::missing_field(&field),
            },
            PricefloorError::Storage(s) => {
                tracing::error!(error = %s, "storage error");
                match s {
                    StorageError::Unavailable { .. } => {
                        ApiError::service_unavailable("Storage temporarily unavailable")
                    }
                    _ => ApiError::database_error("Ledger store operation failed"),
                }
            }
            PricefloorError::Oracle(o) => {
                // The verification gate fails closed instead of surfacing
                // oracle errors; reaching this arm means a programming slip.
                tracing::error!(error = %o, "oracle error escaped the verification gate");
                ApiError::internal_error("Verification oracle failure")
            }
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
