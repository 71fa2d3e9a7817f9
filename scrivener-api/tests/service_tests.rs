//! HTTP tests for export, health, metrics and the OpenAPI document.


use axum::http::{header, StatusCode};
use scrivener_llm::MockCompletionProvider;
use scrivener_test_utils::fixtures::{outline_payload, sample_report};
use test_support::*;

#[tokio::test]
async fn export_returns_plain_text_attachment() -> TestResult {
    let (app, _, _) = test_app(MockCompletionProvider::text(outline_payload())).await?;

    let report = serde_json::to_value(sample_report())?;
    let response = send(&app, json_request("POST", "/api/v1/report/export", &report)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(
        headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("text/plain; charset=utf-8")
    );
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"Q3_Sales_Results.txt\""));

    let text = body_text(response).await?;
    assert!(text.starts_with("Q3 Sales Results\n\n1. Executive Summary\n\n"));
    assert!(text.contains("2.1 Scope\n\n"));
    Ok(())
}

#[tokio::test]
async fn export_rejects_non_report_body() -> TestResult {
    let (app, _, _) = test_app(MockCompletionProvider::text(outline_payload())).await?;

    let body = serde_json::json!({"title": "No report array"});
    let response = send(&app, json_request("POST", "/api/v1/report/export", &body)?).await?;
    assert!(response.status().is_client_error());
    Ok(())
}

#[tokio::test]
async fn health_endpoints_respond() -> TestResult {
    let (app, _, mock) = test_app(MockCompletionProvider::text(outline_payload())).await?;

    let response = send(&app, empty_request("GET", "/health/ping")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await?, "pong");

    let response = send(&app, empty_request("GET", "/health/live")?).await?;
    assert_eq!(body_json(response).await?["status"], "healthy");

    let response = send(&app, empty_request("GET", "/health/ready")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["details"]["prompt_store"]["status"], "healthy");
    assert_eq!(body["details"]["completion_provider"]["name"], "mock/mock-model");
    assert_eq!(mock.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn metrics_count_generations() -> TestResult {
    let (app, _, _) = test_app(MockCompletionProvider::text(outline_payload())).await?;

    send(&app, json_request("POST", "/api/v1/outline", &outline_body())?).await?;

    let response = send(&app, empty_request("GET", "/metrics")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await?;
    assert!(text.contains("scrivener_generations_total"));
    assert!(text.contains("scrivener_http_requests_total"));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> TestResult {
    let (app, _, _) = test_app(MockCompletionProvider::text(outline_payload())).await?;

    let response = send(&app, empty_request("GET", "/openapi.json")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await?;
    assert_eq!(doc["info"]["title"], "Scrivener API");
    assert!(doc["paths"]["/api/v1/report"].is_object());
    Ok(())
}
