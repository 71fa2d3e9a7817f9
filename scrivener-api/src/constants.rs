//! Constants for Scrivener API
//!
//! Defaults for every setting `config` reads from the environment, plus
//! the fixed values used by routes and telemetry.

// ============================================================================
// SERVER
// ============================================================================

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3000;

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// COMPLETION PROVIDER
// ============================================================================

pub const DEFAULT_MODEL: &str = "gpt-4.1";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Output budget for an outline (title plus headings)
pub const DEFAULT_OUTLINE_MAX_TOKENS: i32 = 2000;

/// Output budget for a full report body
pub const DEFAULT_REPORT_MAX_TOKENS: i32 = 8000;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

// ============================================================================
// PROMPT STORAGE
// ============================================================================

pub const DEFAULT_LMDB_PATH: &str = "./data/prompts";

pub const DEFAULT_LMDB_MAX_SIZE_MB: usize = 64;

// ============================================================================
// STREAMING
// ============================================================================

/// Query parameter value that selects SSE output
pub const STREAM_QUERY_TRUE: &str = "true";

/// SSE keep-alive interval in seconds
pub const SSE_KEEP_ALIVE_SECS: u64 = 15;

// ============================================================================
// EXPORT
// ============================================================================

pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
