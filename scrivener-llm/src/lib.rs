//! Scrivener LLM - Completion Provider Layer
//!
//! Provider-agnostic trait for text completion in buffered and streaming
//! form, the OpenAI implementation, and a scripted mock for tests.

pub mod providers;

use async_trait::async_trait;
use futures_util::Stream;
use scrivener_core::{parse_payload, LlmError, ScrivenerError, ScrivenerResult};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub use providers::openai::{OpenAIClient, OpenAICompletionProvider};

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// Sampling and transport options for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Ask the provider for a single JSON object
    pub json_response: bool,
    pub temperature: Option<f32>,
    /// Maximum output tokens
    pub max_tokens: Option<i32>,
    /// Wall-clock budget for the whole call, body included
    pub timeout: Option<Duration>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            json_response: true,
            temperature: None,
            max_tokens: None,
            timeout: None,
        }
    }
}

/// A system+user prompt pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
    pub options: CompletionOptions,
}

impl CompletionRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            options: CompletionOptions::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Finite, non-restartable sequence of text fragments.
///
/// Dropping the stream stops the upstream read.
pub type TextStream = Pin<Box<dyn Stream<Item = ScrivenerResult<String>> + Send>>;

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Trait for completion providers.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name used in errors and logs (e.g. "openai").
    fn provider_id(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model_id(&self) -> &str;

    /// Run a completion and return the full text payload.
    ///
    /// # Returns
    /// * `Ok(String)` - The payload, possibly empty
    /// * `Err(ScrivenerError::Llm)` - Timeout, rate limit or transport failure
    async fn complete(&self, request: &CompletionRequest) -> ScrivenerResult<String>;

    /// Open a streaming completion.
    ///
    /// Errors that happen before the first byte arrives are returned here;
    /// later ones are yielded as stream items.
    async fn complete_stream(&self, request: &CompletionRequest) -> ScrivenerResult<TextStream>;
}

/// Run a completion and parse the payload as a JSON object.
///
/// An empty payload is `LlmError::EmptyResponse`. A payload that does not
/// parse is `ResponseError::Unparseable`; the raw text is logged here and
/// kept on the error, never put in its message.
pub async fn complete_json(
    provider: &dyn CompletionProvider,
    request: &CompletionRequest,
) -> ScrivenerResult<Value> {
    let raw = provider.complete(request).await?;
    payload_to_json(provider.provider_id(), &raw)
}

/// Turn a finished payload into JSON with the same rules as [`complete_json`].
pub fn payload_to_json(provider_id: &str, raw: &str) -> ScrivenerResult<Value> {
    if raw.trim().is_empty() {
        return Err(LlmError::EmptyResponse {
            provider: provider_id.to_string(),
        }
        .into());
    }
    parse_payload(raw).map_err(|e| {
        tracing::warn!(
            provider = provider_id,
            error = %e,
            raw_payload = raw,
            "Completion payload is not valid JSON"
        );
        ScrivenerError::from(e)
    })
}

// ============================================================================
// MOCK PROVIDER
// ============================================================================

/// One scripted provider reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Full payload; streamed as a single fragment
    Text(String),
    /// Payload split into fragments; buffered calls get the concatenation
    Chunks(Vec<String>),
    /// Fragments followed by a mid-stream failure
    ChunksThenError(Vec<String>, ScrivenerError),
    /// Failure before any output
    Error(ScrivenerError),
}

/// Mock completion provider for testing.
///
/// Replies are consumed in order. When only one remains it is reused, so a
/// single-reply mock answers every call the same way.
#[derive(Debug)]
pub struct MockCompletionProvider {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionProvider {
    /// Mock that answers every call with `reply`.
    pub fn new(reply: MockReply) -> Self {
        Self::scripted(vec![reply])
    }

    /// Mock that answers calls from `replies` in order.
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(payload: impl Into<String>) -> Self {
        Self::new(MockReply::Text(payload.into()))
    }

    pub fn failing(error: impl Into<ScrivenerError>) -> Self {
        Self::new(MockReply::Error(error.into()))
    }

    /// Number of calls made so far, buffered and streaming.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn next_reply(&self, request: &CompletionRequest) -> ScrivenerResult<MockReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }
        let mut replies = self.replies.lock().unwrap_or_else(|p| p.into_inner());
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        reply.ok_or_else(|| {
            LlmError::RequestFailed {
                provider: "mock".to_string(),
                status: 0,
                message: "mock script exhausted".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn provider_id(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> ScrivenerResult<String> {
        match self.next_reply(request)? {
            MockReply::Text(text) => Ok(text),
            MockReply::Chunks(chunks) => Ok(chunks.concat()),
            MockReply::ChunksThenError(_, err) | MockReply::Error(err) => Err(err),
        }
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> ScrivenerResult<TextStream> {
        let items: Vec<ScrivenerResult<String>> = match self.next_reply(request)? {
            MockReply::Text(text) => vec![Ok(text)],
            MockReply::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
            MockReply::ChunksThenError(chunks, err) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(err)))
                .collect(),
            MockReply::Error(err) => return Err(err),
        };
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use scrivener_core::ResponseError;

    #[tokio::test]
    async fn test_complete_json_parses_object() {
        let mock = MockCompletionProvider::text(r#"{"title":"T","structure":[]}"#);
        let value = complete_json(&mock, &CompletionRequest::new("hi")).await;
        assert!(matches!(value, Ok(Value::Object(_))));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_complete_json_empty_payload() {
        let mock = MockCompletionProvider::text("   ");
        let err = complete_json(&mock, &CompletionRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScrivenerError::Llm(LlmError::EmptyResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_json_malformed_payload_keeps_raw() {
        let mock = MockCompletionProvider::text("{\"title\": ");
        let err = complete_json(&mock, &CompletionRequest::new("hi"))
            .await
            .unwrap_err();
        match err {
            ScrivenerError::Response(inner @ ResponseError::Unparseable { .. }) => {
                assert_eq!(inner.raw_payload(), Some("{\"title\": "));
                assert!(!inner.to_string().contains("{\"title\": "));
            }
            other => panic!("expected unparseable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_script_order_and_reuse() {
        let mock = MockCompletionProvider::scripted(vec![
            MockReply::Text("one".to_string()),
            MockReply::Text("two".to_string()),
        ]);
        let req = CompletionRequest::new("x").with_system("sys");
        assert_eq!(mock.complete(&req).await.ok().as_deref(), Some("one"));
        assert_eq!(mock.complete(&req).await.ok().as_deref(), Some("two"));
        assert_eq!(mock.complete(&req).await.ok().as_deref(), Some("two"));
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.requests()[0].system.as_deref(), Some("sys"));
    }

    #[tokio::test]
    async fn test_mock_stream_yields_chunks_then_error() {
        let mock = MockCompletionProvider::new(MockReply::ChunksThenError(
            vec!["a".to_string(), "b".to_string()],
            LlmError::StreamInterrupted {
                provider: "mock".to_string(),
                message: "reset".to_string(),
            }
            .into(),
        ));
        let stream = mock
            .complete_stream(&CompletionRequest::new("x"))
            .await
            .expect("stream opens");
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().ok().map(String::as_str), Some("a"));
        assert!(items[2].is_err());
    }

    #[test]
    fn test_default_options_request_json() {
        let req = CompletionRequest::new("u");
        assert!(req.options.json_response);
        assert!(req.system.is_none());
    }
}
