//! Generation Routes
//!
//! `POST /api/v1/outline` and `POST /api/v1/report`. Both answer with JSON
//! by default and with server-sent events when the client asks for
//! `text/event-stream` or passes `?stream=true`.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use scrivener_core::{OutlineResult, ReportResult};

use crate::error::{ApiError, ApiResult};
use crate::relay::into_sse;
use crate::services;
use crate::state::AppState;
use crate::types::{GenerateQuery, OutlinePayload, ReportPayload};

const EVENT_STREAM: &str = "text/event-stream";

/// Whether the response should be an event stream.
fn wants_event_stream(query: &GenerateQuery, headers: &HeaderMap) -> bool {
    query.wants_stream()
        || headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains(EVENT_STREAM))
            .unwrap_or(false)
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/outline - Generate a report outline
#[utoipa::path(
    post,
    path = "/api/v1/outline",
    tag = "Generation",
    params(GenerateQuery),
    request_body = OutlinePayload,
    responses(
        (status = 200, description = "Outline generated; an SSE stream of {chunk, accumulated} events ending in {done, final} or {error} when streaming", body = OutlineResult),
        (status = 400, description = "Missing or invalid field", body = ApiError),
        (status = 408, description = "Generation timed out", body = ApiError),
        (status = 429, description = "Provider rate limit reached", body = ApiError),
        (status = 500, description = "Generation failed", body = ApiError),
    ),
)]
pub async fn create_outline(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
    headers: HeaderMap,
    payload: Result<Json<OutlinePayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let request = payload.into_request()?;

    if wants_event_stream(&query, &headers) {
        return Ok(into_sse(services::stream_outline(&state, request)).into_response());
    }

    let outline = services::generate_outline(&state, &request).await?;
    Ok(Json(outline).into_response())
}

/// POST /api/v1/report - Expand an outline into a full report
#[utoipa::path(
    post,
    path = "/api/v1/report",
    tag = "Generation",
    params(GenerateQuery),
    request_body = ReportPayload,
    responses(
        (status = 200, description = "Report generated; an SSE stream when streaming", body = ReportResult),
        (status = 400, description = "Missing or invalid field", body = ApiError),
        (status = 408, description = "Generation timed out", body = ApiError),
        (status = 429, description = "Provider rate limit reached", body = ApiError),
        (status = 500, description = "Generation failed", body = ApiError),
    ),
)]
pub async fn create_report(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
    headers: HeaderMap,
    payload: Result<Json<ReportPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let request = payload.into_request()?;

    if wants_event_stream(&query, &headers) {
        return Ok(into_sse(services::stream_report(&state, request)).into_response());
    }

    let report = services::generate_report(&state, &request).await?;
    Ok(Json(report).into_response())
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/outline", post(create_outline))
        .route("/report", post(create_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_event_stream_selected_by_accept_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream, application/json"),
        );
        assert!(wants_event_stream(&GenerateQuery::default(), &headers));
    }

    #[test]
    fn test_json_is_default() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!wants_event_stream(&GenerateQuery::default(), &headers));

        let query = GenerateQuery {
            stream: Some("true".to_string()),
        };
        assert!(wants_event_stream(&query, &headers));
    }
}
