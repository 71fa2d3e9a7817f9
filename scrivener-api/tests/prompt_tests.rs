//! HTTP tests for the prompt template admin routes.


use axum::http::StatusCode;
use scrivener_core::{PromptTemplate, PromptType, OUTLINE_DEFAULT_ID, REPORT_DEFAULT_ID};
use scrivener_llm::MockCompletionProvider;
use scrivener_test_utils::fixtures::outline_payload;
use serde_json::json;
use test_support::*;

async fn app() -> TestResult<(axum::Router, std::sync::Arc<scrivener_storage::PromptStore>)> {
    let (app, store, _) = test_app(MockCompletionProvider::text(outline_payload())).await?;
    Ok((app, store))
}

#[tokio::test]
async fn list_returns_seeded_defaults() -> TestResult {
    let (app, _) = app().await?;

    let response = send(&app, empty_request("GET", "/api/v1/prompts")?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let prompts: Vec<PromptTemplate> = serde_json::from_value(body_json(response).await?)?;
    let ids: Vec<&str> = prompts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![OUTLINE_DEFAULT_ID, REPORT_DEFAULT_ID]);
    Ok(())
}

#[tokio::test]
async fn get_by_id_and_unknown_id() -> TestResult {
    let (app, _) = app().await?;

    let uri = format!("/api/v1/prompts/{}", REPORT_DEFAULT_ID);
    let response = send(&app, empty_request("GET", &uri)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let prompt: PromptTemplate = serde_json::from_value(body_json(response).await?)?;
    assert_eq!(prompt.prompt_type, PromptType::Report);

    let response = send(&app, empty_request("GET", "/api/v1/prompts/missing")?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await?["code"], "PROMPT_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn update_changes_content_used_for_generation() -> TestResult {
    let (app, store, mock) = test_app(MockCompletionProvider::text(outline_payload())).await?;

    let uri = format!("/api/v1/prompts/{}", OUTLINE_DEFAULT_ID);
    let update = json!({"content": "Outline {{topic}} for {{audience}}."});
    let response = send(&app, json_request("PUT", &uri, &update)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await?["message"].is_string());

    let stored = store.get(OUTLINE_DEFAULT_ID).await?.ok_or("prompt missing")?;
    assert_eq!(stored.content, "Outline {{topic}} for {{audience}}.");
    assert!(stored.updated_at >= stored.created_at);

    send(&app, json_request("POST", "/api/v1/outline", &outline_body())?).await?;
    assert_eq!(mock.requests()[0].user, "Outline Q3 sales results for executives.");
    Ok(())
}

#[tokio::test]
async fn update_unknown_id_leaves_set_unchanged() -> TestResult {
    let (app, store) = app().await?;
    let before = store.get_all().await?;

    let response = send(
        &app,
        json_request("PUT", "/api/v1/prompts/nope", &json!({"name": "x"}))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.get_all().await?, before);
    Ok(())
}

#[tokio::test]
async fn get_by_type_validates_type() -> TestResult {
    let (app, _) = app().await?;

    let response = send(&app, empty_request("GET", "/api/v1/prompts/type/outline")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?["id"], OUTLINE_DEFAULT_ID);

    let response = send(&app, empty_request("GET", "/api/v1/prompts/type/summary")?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn reset_restores_defaults() -> TestResult {
    let (app, store) = app().await?;

    let uri = format!("/api/v1/prompts/{}", OUTLINE_DEFAULT_ID);
    send(&app, json_request("PUT", &uri, &json!({"content": "edited"}))?).await?;

    let response = send(&app, empty_request("POST", "/api/v1/prompts/reset")?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let prompts = store.get_all().await?;
    assert_eq!(prompts.len(), 2);
    let outline = store
        .get_by_type(PromptType::Outline)
        .await?
        .ok_or("no outline prompt")?;
    assert_eq!(outline.id, OUTLINE_DEFAULT_ID);
    assert_ne!(outline.content, "edited");
    Ok(())
}

#[tokio::test]
async fn reset_segment_is_reserved_for_post() -> TestResult {
    let (app, store) = app().await?;
    let before = store.get_all().await?;

    let response = send(&app, empty_request("GET", "/api/v1/prompts/reset")?).await?;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let update = json!({"content": "x"});
    let response = send(&app, json_request("PUT", "/api/v1/prompts/reset", &update)?).await?;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    assert_eq!(store.get_all().await?, before);
    Ok(())
}
