//! OpenAI HTTP client with rate limiting

use super::types::{ApiError, ErrorDetail};
use crate::providers::{invalid_response, rate_limited, request_failed, timed_out};
use reqwest::{Client, Response, StatusCode};
use scrivener_core::{ScrivenerError, ScrivenerResult};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai";

/// OpenAI API client with rate limiting.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<AtomicU64>,
    min_request_interval_ms: u64,
    start_time: Instant,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `requests_per_minute` - Maximum requests per minute (default: 60)
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        let permits = rpm as usize;
        let min_interval_ms = (60_000 / rpm as u64).max(10);

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limiter: Arc::new(Semaphore::new(permits)),
            last_request: Arc::new(AtomicU64::new(0)),
            min_request_interval_ms: min_interval_ms,
            start_time: Instant::now(),
        }
    }

    /// Point the client at a compatible endpoint (proxy, Azure gateway, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an API request and decode the JSON response body.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
        timeout: Option<Duration>,
    ) -> ScrivenerResult<Res> {
        let response = self.send(endpoint, body, timeout).await?;
        response.json().await.map_err(|e| {
            if e.is_timeout() {
                timed_out(PROVIDER, timeout_ms(timeout))
            } else {
                invalid_response(PROVIDER, format!("Failed to parse response: {}", e))
            }
        })
    }

    /// Send a request with automatic rate limiting and return the raw
    /// response once a success status has arrived.
    ///
    /// The timeout covers the whole exchange including the body, so callers
    /// reading a streamed body are bounded by it as well.
    pub async fn send<Req: Serialize>(
        &self,
        endpoint: &str,
        body: &Req,
        timeout: Option<Duration>,
    ) -> ScrivenerResult<Response> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| request_failed(PROVIDER, 0, format!("Rate limiter error: {}", e)))?;

        // Enforce minimum interval between requests
        let now_ms = self.start_time.elapsed().as_millis() as u64;
        let last_ms = self.last_request.load(Ordering::Relaxed);
        let elapsed = now_ms.saturating_sub(last_ms);

        if last_ms != 0 && elapsed < self.min_request_interval_ms {
            let wait_ms = self.min_request_interval_ms - elapsed;
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }

        self.last_request
            .store(self.start_time.elapsed().as_millis() as u64, Ordering::Relaxed);

        let url = format!("{}/{}", self.base_url, endpoint);
        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e.is_timeout(), &e.to_string(), timeout))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after_ms = parse_retry_after_ms(response.headers()).unwrap_or(0);
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let error_msg = if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
            api_error.error.message
        } else {
            error_text
        };

        tracing::warn!(
            provider = PROVIDER,
            status = status.as_u16(),
            retry_after_ms,
            error = %error_msg,
            "Completion request rejected"
        );

        Err(status_error(PROVIDER, status, retry_after_ms, timeout, error_msg))
    }
}

/// Map a rejected response status to the provider error taxonomy.
pub(crate) fn status_error(
    provider: &str,
    status: StatusCode,
    retry_after_ms: i64,
    timeout: Option<Duration>,
    message: String,
) -> ScrivenerError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => rate_limited(provider, retry_after_ms),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            timed_out(provider, timeout_ms(timeout))
        }
        _ => request_failed(provider, status.as_u16() as i32, message),
    }
}

/// Map a failure to send the request or read its headers.
pub(crate) fn transport_error(
    provider: &str,
    is_timeout: bool,
    message: &str,
    timeout: Option<Duration>,
) -> ScrivenerError {
    if is_timeout {
        timed_out(provider, timeout_ms(timeout))
    } else {
        request_failed(provider, 0, format!("HTTP request failed: {}", message))
    }
}

/// Map an error event sent inside an already-open stream.
///
/// No status line is available at that point, so the error type and code
/// decide the category.
pub(crate) fn error_event(
    provider: &str,
    detail: &ErrorDetail,
    timeout: Option<Duration>,
) -> ScrivenerError {
    let kinds = [detail.r#type.as_deref(), detail.code.as_deref()];
    let is_any = |names: &[&str]| kinds.iter().flatten().any(|k| names.contains(k));

    if is_any(&["rate_limit_exceeded", "insufficient_quota", "tokens", "requests"]) {
        rate_limited(provider, 0)
    } else if is_any(&["timeout", "request_timeout"]) {
        timed_out(provider, timeout_ms(timeout))
    } else {
        request_failed(provider, 0, detail.message.clone())
    }
}

pub(crate) fn timeout_ms(timeout: Option<Duration>) -> u64 {
    timeout.map(|t| t.as_millis() as u64).unwrap_or(0)
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .map(|seconds| (seconds * 1000.0) as i64)
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("min_request_interval_ms", &self.min_request_interval_ms)
            .finish()
    }
}
