//! API error handling.
//!
//! Every failure leaves the API as a JSON body of the form
//! `{"error": "<message>", "code": "<CODE>"}` with the matching status.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::service::ServiceError;

// =============================================================================
// API Error
// =============================================================================

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ApiError {
    /// Creates a new API error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Error details.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a new API error response.
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// Creates a 400 Bad Request response.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiError::new("BAD_REQUEST", message),
        )
    }

    /// Creates a 404 Not Found response.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    /// Creates a duplicate-key response.
    ///
    /// Duplicates are reported as 400 for compatibility with existing
    /// clients; the `CONFLICT` code distinguishes them from validation errors.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new("CONFLICT", message))
    }

    /// Creates a 500 Internal Server Error response.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("INTERNAL_ERROR", message),
        )
    }

    /// Converts a service error, logging it.
    ///
    /// `context` is the client-facing message for store failures, whose
    /// details are only logged.
    #[must_use]
    pub fn from_service_error(error: ServiceError, context: &'static str) -> Self {
        match error {
            ServiceError::BadRequest(message) => {
                tracing::warn!(%message, "Rejected request");
                Self::bad_request(message)
            }
            ServiceError::Conflict(message) => {
                tracing::warn!(%message, "Duplicate key");
                Self::conflict(message)
            }
            ServiceError::NotFound(message) => {
                tracing::warn!(%message, "Referenced record not found");
                Self::not_found(message)
            }
            ServiceError::StoreUnavailable(detail) => {
                tracing::error!(%detail, context, "Store failure");
                Self::internal_error(context)
            }
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection, "Malformed JSON body");
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        tracing::warn!(error = %rejection, "Malformed query string");
        Self::bad_request(rejection.body_text())
    }
}

// =============================================================================
// Tests
// =============================================================================
