//! API Configuration Module
//!
//! Configuration for CORS, the completion provider and prompt storage.
//! Everything is loaded from environment variables with defaults suitable
//! for development; only the provider API key is mandatory.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use scrivener_core::ConfigError;

use crate::constants::{
    DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_LMDB_MAX_SIZE_MB, DEFAULT_LMDB_PATH, DEFAULT_MODEL,
    DEFAULT_OUTLINE_MAX_TOKENS, DEFAULT_REPORT_MAX_TOKENS, DEFAULT_REQUESTS_PER_MINUTE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STREAM_TIMEOUT_SECS, DEFAULT_TEMPERATURE,
};

/// Parse an optional environment variable, reporting unparseable values.
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP surface configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SCRIVENER_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `SCRIVENER_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `SCRIVENER_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("SCRIVENER_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("SCRIVENER_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("SCRIVENER_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CORS_MAX_AGE_SECS);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

// ============================================================================
// COMPLETION PROVIDER CONFIGURATION
// ============================================================================

/// Completion provider settings plus the per-kind generation budgets.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    /// Override for OpenAI-compatible gateways
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub outline_max_tokens: i32,
    pub report_max_tokens: i32,
    /// Budget for a buffered completion
    pub request_timeout: Duration,
    /// Budget for a whole streamed completion
    pub stream_timeout: Duration,
    pub requests_per_minute: u32,
}

impl LlmConfig {
    /// Defaults with the given key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            outline_max_tokens: DEFAULT_OUTLINE_MAX_TOKENS,
            report_max_tokens: DEFAULT_REPORT_MAX_TOKENS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stream_timeout: Duration::from_secs(DEFAULT_STREAM_TIMEOUT_SECS),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }

    /// Create LlmConfig from environment variables.
    ///
    /// Environment variables:
    /// - `OPENAI_API_KEY`: required
    /// - `SCRIVENER_OPENAI_BASE_URL`: optional endpoint override
    /// - `SCRIVENER_MODEL`: model id (default: gpt-4.1)
    /// - `SCRIVENER_TEMPERATURE`: 0.0 to 2.0 (default: 0.7)
    /// - `SCRIVENER_OUTLINE_MAX_TOKENS` / `SCRIVENER_REPORT_MAX_TOKENS`
    /// - `SCRIVENER_REQUEST_TIMEOUT_SECS` / `SCRIVENER_STREAM_TIMEOUT_SECS`
    /// - `SCRIVENER_REQUESTS_PER_MINUTE`: client-side throttle (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_non_empty("OPENAI_API_KEY").ok_or_else(|| ConfigError::MissingRequired {
            field: "OPENAI_API_KEY".to_string(),
        })?;

        let config = Self {
            api_key,
            base_url: env_non_empty("SCRIVENER_OPENAI_BASE_URL"),
            model: env_non_empty("SCRIVENER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: env_parse("SCRIVENER_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            outline_max_tokens: env_parse("SCRIVENER_OUTLINE_MAX_TOKENS", DEFAULT_OUTLINE_MAX_TOKENS)?,
            report_max_tokens: env_parse("SCRIVENER_REPORT_MAX_TOKENS", DEFAULT_REPORT_MAX_TOKENS)?,
            request_timeout: Duration::from_secs(env_parse(
                "SCRIVENER_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            stream_timeout: Duration::from_secs(env_parse(
                "SCRIVENER_STREAM_TIMEOUT_SECS",
                DEFAULT_STREAM_TIMEOUT_SECS,
            )?),
            requests_per_minute: env_parse(
                "SCRIVENER_REQUESTS_PER_MINUTE",
                DEFAULT_REQUESTS_PER_MINUTE,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Range checks that parsing alone does not cover.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "SCRIVENER_TEMPERATURE".to_string(),
                value: self.temperature.to_string(),
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }
        for (field, value) in [
            ("SCRIVENER_OUTLINE_MAX_TOKENS", self.outline_max_tokens),
            ("SCRIVENER_REPORT_MAX_TOKENS", self.report_max_tokens),
        ] {
            if value <= 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        }
        for (field, value) in [
            ("SCRIVENER_REQUEST_TIMEOUT_SECS", self.request_timeout),
            ("SCRIVENER_STREAM_TIMEOUT_SECS", self.stream_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "must be at least one second".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("outline_max_tokens", &self.outline_max_tokens)
            .field("report_max_tokens", &self.report_max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("stream_timeout", &self.stream_timeout)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

// ============================================================================
// STORAGE CONFIGURATION
// ============================================================================

/// Which prompt backend to open at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageConfig {
    #[default]
    Memory,
    Lmdb { path: PathBuf, max_size_mb: usize },
}

impl StorageConfig {
    /// Create StorageConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SCRIVENER_PROMPT_BACKEND`: "memory" (default) or "lmdb"
    /// - `SCRIVENER_LMDB_PATH`: directory for the LMDB files
    /// - `SCRIVENER_LMDB_MAX_SIZE_MB`: map size (default: 64)
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = env_non_empty("SCRIVENER_PROMPT_BACKEND")
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "memory".to_string());

        match backend.as_str() {
            "memory" => Ok(Self::Memory),
            "lmdb" => Ok(Self::Lmdb {
                path: env_non_empty("SCRIVENER_LMDB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LMDB_PATH)),
                max_size_mb: env_parse("SCRIVENER_LMDB_MAX_SIZE_MB", DEFAULT_LMDB_MAX_SIZE_MB)?,
            }),
            other => Err(ConfigError::InvalidValue {
                field: "SCRIVENER_PROMPT_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected 'memory' or 'lmdb'".to_string(),
            }),
        }
    }
}
