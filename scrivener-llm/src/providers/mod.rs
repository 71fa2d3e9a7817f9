//! Completion provider implementations and shared error constructors.

pub mod openai;

pub use openai::{OpenAIClient, OpenAICompletionProvider};

use scrivener_core::{LlmError, ScrivenerError};

pub(crate) fn request_failed(
    provider: &str,
    status: i32,
    message: impl Into<String>,
) -> ScrivenerError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
    .into()
}

pub(crate) fn rate_limited(provider: &str, retry_after_ms: i64) -> ScrivenerError {
    LlmError::RateLimited {
        provider: provider.to_string(),
        retry_after_ms,
    }
    .into()
}

pub(crate) fn timed_out(provider: &str, after_ms: u64) -> ScrivenerError {
    LlmError::Timeout {
        provider: provider.to_string(),
        after_ms,
    }
    .into()
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> ScrivenerError {
    LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
    .into()
}

pub(crate) fn stream_interrupted(provider: &str, message: impl Into<String>) -> ScrivenerError {
    LlmError::StreamInterrupted {
        provider: provider.to_string(),
        message: message.into(),
    }
    .into()
}

pub(crate) fn empty_response(provider: &str) -> ScrivenerError {
    LlmError::EmptyResponse {
        provider: provider.to_string(),
    }
    .into()
}
