//! Report Export Route
//!
//! Renders a finished report as a numbered plain-text download.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use scrivener_core::{export_file_name, ReportResult};

use crate::constants::PLAIN_TEXT_CONTENT_TYPE;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `Content-Disposition` value for a download named after `title`.
///
/// The quoted `filename` is ASCII only; `filename*` carries the full UTF-8
/// name for clients that understand it.
pub fn attachment_disposition(title: &str) -> String {
    let file_name = export_file_name(title);
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(&file_name)
    )
}

/// POST /api/v1/report/export - Download a report as plain text
#[utoipa::path(
    post,
    path = "/api/v1/report/export",
    tag = "Generation",
    request_body = ReportResult,
    responses(
        (status = 200, description = "Plain-text report", body = String, content_type = "text/plain"),
        (status = 400, description = "Body is not a report", body = ApiError),
    ),
)]
pub async fn export_report(
    payload: Result<Json<ReportResult>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(report) = payload?;

    let disposition = HeaderValue::from_str(&attachment_disposition(&report.title))
        .map_err(|e| ApiError::internal_error(format!("Invalid export file name: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.to_plain_text(),
    )
        .into_response())
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/report/export", post(export_report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_ascii_title() {
        assert_eq!(
            attachment_disposition("Q3 Review"),
            "attachment; filename=\"Q3_Review.txt\"; filename*=UTF-8''Q3_Review.txt"
        );
    }

    #[test]
    fn test_disposition_non_ascii_title_is_header_safe() {
        let value = attachment_disposition("연간 보고서");
        assert!(value.contains("filename=\"______.txt\""));
        assert!(value.contains("filename*=UTF-8''%EC%97%B0"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}
