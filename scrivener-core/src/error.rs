//! Error types for Scrivener operations

use thiserror::Error;

/// Completion provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("Request to {provider} timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Stream from {provider} broke: {message}")]
    StreamInterrupted { provider: String, message: String },

    #[error("No response received from {provider}")]
    EmptyResponse { provider: String },

    #[error("Invalid response envelope from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors raised while turning a model payload into a typed result.
///
/// `Unparseable` keeps the raw payload for diagnostics. It is deliberately
/// absent from the `Display` output so it never reaches an end user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("Failed to parse response: {reason}")]
    Unparseable { reason: String, raw: String },

    #[error("Response is missing required field at {path}")]
    MissingField { path: String },

    #[error("Response has invalid value at {path}: {reason}")]
    InvalidField { path: String, reason: String },
}

impl ResponseError {
    /// Raw model payload, when one was retained.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Unparseable { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Request validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Prompt storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Prompt not found: {id}")]
    PromptNotFound { id: String },

    #[error("Backend operation {operation} failed: {reason}")]
    Backend { operation: String, reason: String },

    #[error("Failed to (de)serialize prompt {id}: {reason}")]
    Serialization { id: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Scrivener errors.
#[derive(Debug, Clone, Error)]
pub enum ScrivenerError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl ScrivenerError {
    /// Message suitable for showing to the person who submitted the request.
    ///
    /// Provider internals and raw payloads are never included.
    pub fn user_message(&self) -> String {
        match self {
            Self::Llm(LlmError::Timeout { .. }) => {
                "Generation timed out. Shorten the content or try again.".to_string()
            }
            Self::Llm(LlmError::RateLimited { .. }) => {
                "The API usage limit has been reached. Please wait a moment and try again."
                    .to_string()
            }
            Self::Llm(LlmError::EmptyResponse { .. }) => {
                "No response received from the model. Please try again.".to_string()
            }
            Self::Llm(LlmError::RequestFailed { status: 0, .. }) => {
                "Generation failed: the model service reported an error.".to_string()
            }
            Self::Llm(LlmError::RequestFailed { status, .. }) => {
                format!("Generation failed: the model service returned status {}.", status)
            }
            Self::Llm(LlmError::StreamInterrupted { .. }) => {
                "Generation failed: the connection to the model service was interrupted."
                    .to_string()
            }
            Self::Llm(LlmError::InvalidResponse { .. }) => {
                "Generation failed: the model service sent a reply that could not be read."
                    .to_string()
            }
            Self::Response(ResponseError::Unparseable { .. }) => {
                "Failed to parse the model response. Please try again.".to_string()
            }
            Self::Response(err) => {
                format!("Failed to parse the model response: {}", err)
            }
            Self::Validation(err) => err.to_string(),
            Self::Storage(StorageError::PromptNotFound { id }) => {
                format!("Prompt '{}' was not found.", id)
            }
            Self::Storage(_) => "Prompt storage is unavailable.".to_string(),
            Self::Config(err) => err.to_string(),
        }
    }
}

/// Result type alias for Scrivener operations.
pub type ScrivenerResult<T> = Result<T, ScrivenerError>;

// =============================================================================
// TESTS
// =============================================================================
