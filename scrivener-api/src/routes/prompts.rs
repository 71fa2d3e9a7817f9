//! Prompt Template Routes
//!
//! Read and edit the stored prompt templates. Templates cannot be created
//! or deleted; `POST /reset` restores the built-in pair.
//!
//! `reset` and `type` are reserved segments under `/api/v1/prompts`. Prompt
//! ids are fixed by the built-in set and never take those values, so
//! `GET /api/v1/prompts/reset` is answered with 405 rather than a lookup.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use scrivener_core::{PromptTemplate, PromptType, PromptUpdate};
use scrivener_storage::PromptStore;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;
use crate::types::MessageResponse;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/prompts - List every template
#[utoipa::path(
    get,
    path = "/api/v1/prompts",
    tag = "Prompts",
    responses(
        (status = 200, description = "All templates in storage order", body = Vec<PromptTemplate>),
        (status = 500, description = "Storage unavailable", body = ApiError),
    ),
)]
pub async fn list_prompts(
    State(store): State<Arc<PromptStore>>,
) -> ApiResult<Json<Vec<PromptTemplate>>> {
    let prompts = store.get_all().await?;
    Ok(Json(prompts))
}

/// GET /api/v1/prompts/{id} - Get one template
#[utoipa::path(
    get,
    path = "/api/v1/prompts/{id}",
    tag = "Prompts",
    params(
        ("id" = String, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template found", body = PromptTemplate),
        (status = 404, description = "Template not found", body = ApiError),
    ),
)]
pub async fn get_prompt(
    State(store): State<Arc<PromptStore>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PromptTemplate>> {
    let prompt = store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::prompt_not_found(&id))?;
    Ok(Json(prompt))
}

/// PUT /api/v1/prompts/{id} - Update name, description or content
#[utoipa::path(
    put,
    path = "/api/v1/prompts/{id}",
    tag = "Prompts",
    params(
        ("id" = String, Path, description = "Template ID")
    ),
    request_body = PromptUpdate,
    responses(
        (status = 200, description = "Template updated", body = MessageResponse),
        (status = 400, description = "Invalid body", body = ApiError),
        (status = 404, description = "Template not found", body = ApiError),
    ),
)]
pub async fn update_prompt(
    State(store): State<Arc<PromptStore>>,
    Path(id): Path<String>,
    payload: Result<Json<PromptUpdate>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(update) = payload?;

    if !store.update(&id, &update).await? {
        return Err(ApiError::prompt_not_found(&id));
    }

    tracing::info!(prompt_id = %id, content_changed = update.content.is_some(), "Prompt updated");
    Ok(Json(MessageResponse::new("Prompt updated successfully")))
}

/// GET /api/v1/prompts/type/{type} - First template of a type
#[utoipa::path(
    get,
    path = "/api/v1/prompts/type/{type}",
    tag = "Prompts",
    params(
        ("type" = String, Path, description = "outline or report")
    ),
    responses(
        (status = 200, description = "Template found", body = PromptTemplate),
        (status = 400, description = "Unknown prompt type", body = ApiError),
        (status = 404, description = "No template of this type", body = ApiError),
    ),
)]
pub async fn get_prompt_by_type(
    State(store): State<Arc<PromptStore>>,
    Path(prompt_type): Path<String>,
) -> ApiResult<Json<PromptTemplate>> {
    let parsed = PromptType::from_db_str(&prompt_type)
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let prompt = store
        .get_by_type(parsed)
        .await?
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::PromptNotFound,
                format!("No prompt of type '{}' exists.", parsed),
            )
        })?;
    Ok(Json(prompt))
}

/// POST /api/v1/prompts/reset - Restore the built-in templates
#[utoipa::path(
    post,
    path = "/api/v1/prompts/reset",
    tag = "Prompts",
    responses(
        (status = 200, description = "Templates reset", body = MessageResponse),
        (status = 500, description = "Storage unavailable", body = ApiError),
    ),
)]
pub async fn reset_prompts(
    State(store): State<Arc<PromptStore>>,
) -> ApiResult<Json<MessageResponse>> {
    store.reset().await?;
    tracing::info!(backend = store.backend_name(), "Prompts reset to defaults");
    Ok(Json(MessageResponse::new("Prompts reset to defaults")))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_prompts))
        .route("/reset", post(reset_prompts))
        .route("/type/:prompt_type", get(get_prompt_by_type))
        .route("/:id", get(get_prompt).put(update_prompt))
}
