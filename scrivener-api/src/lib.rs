//! Scrivener API - HTTP Layer
//!
//! Axum server for outline and report generation. Each generation endpoint
//! answers with a validated JSON result, or relays the model output as
//! server-sent events. Prompt templates are read and edited through the
//! `/api/v1/prompts` routes and live in a `PromptStore`.

#[macro_use]
pub mod macros;

pub mod config;
pub mod constants;
pub mod error;
pub mod openapi;
pub mod relay;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

pub use config::{ApiConfig, LlmConfig, StorageConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use relay::{RelayEvent, RelayState, StreamRelay};
pub use routes::create_api_router;
pub use services::{GenerationKind, GenerationMode, GenerationSettings};
pub use state::AppState;
pub use types::*;
