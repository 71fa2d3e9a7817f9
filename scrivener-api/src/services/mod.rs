//! Service Layer
//!
//! Generation pipeline shared by the outline and report endpoints: template
//! lookup with built-in fallback, rendering, the completion call and
//! validation of the model payload. Services return `ScrivenerResult` so the
//! same error reaches both the JSON handlers and the stream relay.

mod outline_service;
mod report_service;

pub use outline_service::*;
pub use report_service::*;

use std::time::Duration;

use scrivener_core::{
    default_content, render, unresolved, LlmError, PromptType, ResponseError, ScrivenerError,
    ScrivenerResult, TemplateFields, OUTLINE_SYSTEM_INSTRUCTION, REPORT_SYSTEM_INSTRUCTION,
};
use scrivener_llm::{payload_to_json, CompletionOptions};
use scrivener_storage::PromptStore;
use serde::Serialize;
use serde_json::Value;

use crate::config::LlmConfig;
use crate::constants::{
    DEFAULT_OUTLINE_MAX_TOKENS, DEFAULT_REPORT_MAX_TOKENS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STREAM_TIMEOUT_SECS, DEFAULT_TEMPERATURE,
};

// ============================================================================
// SETTINGS
// ============================================================================

/// Sampling and budget settings applied to every generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub outline_max_tokens: i32,
    pub report_max_tokens: i32,
    pub request_timeout: Duration,
    pub stream_timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            outline_max_tokens: DEFAULT_OUTLINE_MAX_TOKENS,
            report_max_tokens: DEFAULT_REPORT_MAX_TOKENS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stream_timeout: Duration::from_secs(DEFAULT_STREAM_TIMEOUT_SECS),
        }
    }
}

impl From<&LlmConfig> for GenerationSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            outline_max_tokens: config.outline_max_tokens,
            report_max_tokens: config.report_max_tokens,
            request_timeout: config.request_timeout,
            stream_timeout: config.stream_timeout,
        }
    }
}

impl GenerationSettings {
    /// Completion options for one call of `kind`.
    pub fn options(&self, kind: GenerationKind, mode: GenerationMode) -> CompletionOptions {
        CompletionOptions {
            json_response: true,
            temperature: Some(self.temperature),
            max_tokens: Some(match kind {
                GenerationKind::Outline => self.outline_max_tokens,
                GenerationKind::Report => self.report_max_tokens,
            }),
            timeout: Some(match mode {
                GenerationMode::Buffered => self.request_timeout,
                GenerationMode::Stream => self.stream_timeout,
            }),
        }
    }
}

// ============================================================================
// KIND AND MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Outline,
    Report,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Report => "report",
        }
    }

    pub fn prompt_type(&self) -> PromptType {
        match self {
            Self::Outline => PromptType::Outline,
            Self::Report => PromptType::Report,
        }
    }

    pub fn system_instruction(&self) -> &'static str {
        match self {
            Self::Outline => OUTLINE_SYSTEM_INSTRUCTION,
            Self::Report => REPORT_SYSTEM_INSTRUCTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Buffered,
    Stream,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Stream => "stream",
        }
    }
}

/// Short failure kind used as a metric label.
pub fn failure_label(err: &ScrivenerError) -> &'static str {
    match err {
        ScrivenerError::Validation(_) => "validation",
        ScrivenerError::Llm(LlmError::Timeout { .. }) => "timeout",
        ScrivenerError::Llm(LlmError::RateLimited { .. }) => "rate_limited",
        ScrivenerError::Llm(LlmError::EmptyResponse { .. }) => "empty_response",
        ScrivenerError::Llm(_) => "upstream",
        ScrivenerError::Response(_) => "invalid_response",
        ScrivenerError::Storage(_) => "storage",
        ScrivenerError::Config(_) => "config",
    }
}

// ============================================================================
// PIPELINE STEPS
// ============================================================================

/// Stored template for `kind`, or the built-in one when none is stored.
pub async fn resolve_template(store: &PromptStore, kind: GenerationKind) -> ScrivenerResult<String> {
    match store.get_by_type(kind.prompt_type()).await? {
        Some(template) => {
            tracing::debug!(kind = kind.as_str(), prompt_id = %template.id, "Using stored prompt");
            Ok(template.content)
        }
        None => {
            tracing::warn!(kind = kind.as_str(), "No stored prompt; using built-in default");
            Ok(default_content(kind.prompt_type()).to_string())
        }
    }
}

/// Render `template`, leaving tokens without a field in place.
pub fn render_prompt(kind: GenerationKind, template: &str, fields: &TemplateFields) -> String {
    let missing = unresolved(template, fields);
    if !missing.is_empty() {
        tracing::warn!(
            kind = kind.as_str(),
            missing = ?missing,
            "Prompt references fields with no value; tokens left verbatim"
        );
    }
    render(template, fields)
}

/// Validate a parsed payload, logging it when it does not match.
pub(crate) fn check_payload<T>(
    kind: GenerationKind,
    value: &Value,
    validate: fn(&Value) -> Result<T, ResponseError>,
) -> ScrivenerResult<T> {
    validate(value).map_err(|e| {
        tracing::warn!(
            kind = kind.as_str(),
            error = %e,
            raw_payload = %value,
            "Model payload failed validation"
        );
        ScrivenerError::from(e)
    })
}

/// Turn an accumulated stream payload into the `final` string: parse,
/// validate, then re-serialize the typed result.
pub(crate) fn finalize_payload<T: Serialize>(
    kind: GenerationKind,
    provider_id: &str,
    raw: &str,
    validate: fn(&Value) -> Result<T, ResponseError>,
) -> ScrivenerResult<String> {
    let value = payload_to_json(provider_id, raw)?;
    let result = check_payload(kind, &value, validate)?;
    serde_json::to_string(&result).map_err(|e| {
        ScrivenerError::from(ResponseError::InvalidField {
            path: "$".to_string(),
            reason: e.to_string(),
        })
    })
}
