//! OpenAPI Specification for Scrivener API
//!
//! Built by utoipa from the route annotations and the schema derives in
//! `scrivener-core` and this crate.

use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{export, generate, health, prompts};
use crate::telemetry::metrics;
use crate::types::{MessageResponse, OutlinePayload, ReportPayload};

use scrivener_core::{
    Audience, OutlineResult, OutlineSection, PromptTemplate, PromptType, PromptUpdate,
    ReportItem, ReportResult, ReportSection, Tone,
};

/// OpenAPI document for Scrivener API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scrivener API",
        version = "0.1.0",
        description = "Report outline and body generation backed by a chat-completion model, with editable prompt templates",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Generation", description = "Outline and report generation, JSON or server-sent events"),
        (name = "Prompts", description = "Prompt template administration"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Generation Routes ===
        generate::create_outline,
        generate::create_report,
        export::export_report,

        // === Prompt Routes ===
        prompts::list_prompts,
        prompts::get_prompt,
        prompts::update_prompt,
        prompts::get_prompt_by_type,
        prompts::reset_prompts,

        // === Health and Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Generation Types ===
            OutlinePayload, ReportPayload, OutlineResult, OutlineSection,
            ReportResult, ReportItem, ReportSection, Audience, Tone,

            // === Prompt Types ===
            PromptTemplate, PromptUpdate, PromptType, MessageResponse,

            // === Health Types ===
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth,
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

/// Handler for /openapi.json endpoint.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
