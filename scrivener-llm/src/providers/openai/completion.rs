//! OpenAI chat completion provider implementation

use super::client::OpenAIClient;
use super::stream::spawn_fragment_stream;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, Message, ResponseFormat};
use crate::providers::empty_response;
use crate::{CompletionProvider, CompletionRequest, TextStream};
use async_trait::async_trait;
use scrivener_core::ScrivenerResult;
use std::time::Instant;

const PROVIDER: &str = "openai";

/// OpenAI completion provider using chat models.
pub struct OpenAICompletionProvider {
    client: OpenAIClient,
    model: String,
}

impl OpenAICompletionProvider {
    /// Create a new OpenAI completion provider.
    ///
    /// # Arguments
    /// * `client` - Configured HTTP client
    /// * `model` - Model name (e.g., "gpt-4.1", "gpt-4o-mini")
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(request.user.clone()));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.options.max_tokens,
            temperature: request.options.temperature,
            response_format: request
                .options
                .json_response
                .then(ResponseFormat::json_object),
            stream,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompletionProvider {
    fn provider_id(&self) -> &str {
        PROVIDER
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> ScrivenerResult<String> {
        let body = self.build_request(request, false);
        let started = Instant::now();

        let response: ChatCompletionResponse = self
            .client
            .request("chat/completions", &body, request.options.timeout)
            .await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                provider = PROVIDER,
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens.unwrap_or(0),
                latency_ms = started.elapsed().as_millis() as u64,
                "Completion finished"
            );
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| empty_response(PROVIDER))?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!(
                provider = PROVIDER,
                model = %self.model,
                max_tokens = request.options.max_tokens.unwrap_or(0),
                "Completion truncated at max_tokens"
            );
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(empty_response(PROVIDER)),
        }
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> ScrivenerResult<TextStream> {
        let body = self.build_request(request, true);
        let response = self
            .client
            .send("chat/completions", &body, request.options.timeout)
            .await?;
        tracing::debug!(provider = PROVIDER, model = %self.model, "Completion stream opened");
        Ok(spawn_fragment_stream(PROVIDER, response, request.options.timeout))
    }
}

impl std::fmt::Debug for OpenAICompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompletionProvider")
            .field("model", &self.model)
            .field("client", &self.client)
            .finish()
    }
}
