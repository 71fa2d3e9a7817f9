//! REST API Routes Module
//!
//! - Outline and report generation, JSON or SSE (`/api/v1/outline`, `/api/v1/report`)
//! - Plain-text report export (`/api/v1/report/export`)
//! - Prompt template admin (`/api/v1/prompts/*`)
//! - Health checks at /health/*, metrics at /metrics, OpenAPI at /openapi.json

pub mod export;
pub mod generate;
pub mod health;
pub mod prompts;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::openapi::openapi_json;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware, TelemetryConfig};

pub use export::create_router as export_router;
pub use generate::create_router as generate_router;
pub use health::create_router as health_router;
pub use prompts::create_router as prompts_router;

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins every origin is allowed.
pub fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

fn is_production_environment() -> bool {
    std::env::var("SCRIVENER_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS - handles preflight requests
/// 2. Observability - span, metrics and completion log per request
///
/// `/metrics` is only mounted when `telemetry.metrics_enabled` is set.
pub fn create_api_router(
    state: AppState,
    api_config: &ApiConfig,
    telemetry: &TelemetryConfig,
) -> ApiResult<Router> {
    if is_production_environment() && !api_config.is_production() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set SCRIVENER_CORS_ORIGINS.",
        ));
    }

    let api_routes = Router::new()
        .merge(generate_router())
        .merge(export_router())
        .nest("/prompts", prompts_router());

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_router())
        .route("/openapi.json", get(openapi_json));

    if telemetry.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    let router = router.with_state(state);

    let cors = build_cors_layer(api_config);

    Ok(router.layer(from_fn(observability_middleware)).layer(cors))
}
