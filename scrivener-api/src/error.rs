//! Error Types for Scrivener API
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//! - Translation of `ScrivenerError` into user-facing messages
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scrivener_core::{LlmError, ResponseError, ScrivenerError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested prompt template does not exist
    PromptNotFound,

    // ========================================================================
    // Upstream Errors (408, 429, 500)
    // ========================================================================
    /// The completion call exceeded its time budget
    Timeout,

    /// The completion provider's quota or rate limit was hit
    TooManyRequests,

    /// The completion provider failed or the connection broke
    UpstreamFailed,

    /// The completion provider returned nothing
    EmptyResponse,

    /// The model payload did not parse or failed validation
    ResponseInvalid,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Prompt storage failed
    StorageError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::MissingField => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::PromptNotFound => StatusCode::NOT_FOUND,

            ErrorCode::Timeout => StatusCode::REQUEST_TIMEOUT,

            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            ErrorCode::UpstreamFailed
            | ErrorCode::EmptyResponse
            | ErrorCode::ResponseInvalid
            | ErrorCode::InternalError
            | ErrorCode::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
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

/// Structured error response for API operations.
///
/// Returned by every endpoint on failure. The same message is what a
/// streaming request receives in its terminal `{error}` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (offending field, retry hint)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error naming the field.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn prompt_not_found(id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::PromptNotFound, format!("Prompt '{}' was not found.", id))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Implement IntoResponse for ApiError to enable automatic error handling in Axum.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

fn code_for(err: &ScrivenerError) -> ErrorCode {
    match err {
        ScrivenerError::Validation(ValidationError::RequiredFieldMissing { .. }) => {
            ErrorCode::MissingField
        }
        ScrivenerError::Validation(ValidationError::InvalidValue { .. }) => {
            ErrorCode::ValidationFailed
        }
        ScrivenerError::Llm(LlmError::Timeout { .. }) => ErrorCode::Timeout,
        ScrivenerError::Llm(LlmError::RateLimited { .. }) => ErrorCode::TooManyRequests,
        ScrivenerError::Llm(LlmError::EmptyResponse { .. }) => ErrorCode::EmptyResponse,
        ScrivenerError::Llm(_) => ErrorCode::UpstreamFailed,
        ScrivenerError::Response(_) => ErrorCode::ResponseInvalid,
        ScrivenerError::Storage(StorageError::PromptNotFound { .. }) => ErrorCode::PromptNotFound,
        ScrivenerError::Storage(_) => ErrorCode::StorageError,
        ScrivenerError::Config(_) => ErrorCode::InternalError,
    }
}

/// Convert a domain error into its HTTP form.
///
/// The full error goes to the log; the response carries only
/// `ScrivenerError::user_message()`.
impl From<ScrivenerError> for ApiError {
    fn from(err: ScrivenerError) -> Self {
        let code = code_for(&err);
        if code.status_code().is_server_error() {
            tracing::error!(error = %err, code = %code, "Request failed");
        } else {
            tracing::debug!(error = %err, code = %code, "Request rejected");
        }

        let api_error = ApiError::new(code, err.user_message());
        match &err {
            ScrivenerError::Validation(
                ValidationError::RequiredFieldMissing { field }
                | ValidationError::InvalidValue { field, .. },
            ) => api_error.with_details(serde_json::json!({ "field": field })),
            ScrivenerError::Llm(LlmError::RateLimited { retry_after_ms, .. })
                if *retry_after_ms > 0 =>
            {
                api_error.with_details(serde_json::json!({ "retryAfterMs": retry_after_ms }))
            }
            ScrivenerError::Response(
                ResponseError::MissingField { path } | ResponseError::InvalidField { path, .. },
            ) => api_error.with_details(serde_json::json!({ "path": path })),
            _ => api_error,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ScrivenerError::from(err).into()
    }
}

/// Malformed or mistyped request bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::invalid_input(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::internal_error("Failed to serialize response")
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
