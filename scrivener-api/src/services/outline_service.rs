//! Outline Service
//!
//! Turns an `OutlineRequest` into a validated `OutlineResult`.

use std::time::Instant;

use futures_util::Stream;
use scrivener_core::{
    validate_outline, OutlineRequest, OutlineResult, ScrivenerResult, TemplateFields,
};
use scrivener_llm::{complete_json, CompletionRequest};
use scrivener_storage::PromptStore;

use super::{
    check_payload, failure_label, finalize_payload, render_prompt, resolve_template,
    GenerationKind, GenerationMode, GenerationSettings,
};
use crate::relay::{relay_events, RelayEvent};
use crate::state::AppState;
use crate::telemetry::record_generation;

const KIND: GenerationKind = GenerationKind::Outline;

/// Template fields for an outline prompt.
///
/// `tone` is only set when the request carries one.
pub fn outline_fields(request: &OutlineRequest) -> TemplateFields {
    let mut fields = TemplateFields::new()
        .with("purpose", request.purpose.as_str())
        .with("topic", request.topic.as_str())
        .with("audience", request.audience.label())
        .with("content", request.content.as_str());
    if let Some(tone) = request.tone {
        fields.insert("tone", tone.label());
        fields.insert("style", tone.label());
    }
    fields
}

/// Completion request for `request`, rendered from the stored template.
pub async fn outline_completion(
    store: &PromptStore,
    settings: &GenerationSettings,
    request: &OutlineRequest,
    mode: GenerationMode,
) -> ScrivenerResult<CompletionRequest> {
    let template = resolve_template(store, KIND).await?;
    let prompt = render_prompt(KIND, &template, &outline_fields(request));
    Ok(CompletionRequest::new(prompt)
        .with_system(KIND.system_instruction())
        .with_options(settings.options(KIND, mode)))
}

/// Generate an outline and wait for the whole result.
///
/// No retries: a failed call is reported to the caller as is.
pub async fn generate_outline(
    state: &AppState,
    request: &OutlineRequest,
) -> ScrivenerResult<OutlineResult> {
    let started = Instant::now();
    tracing::info!(
        provider = state.provider.provider_id(),
        model = state.provider.model_id(),
        audience = %request.audience,
        "Generating outline"
    );

    let result = async {
        let completion =
            outline_completion(&state.store, &state.generation, request, GenerationMode::Buffered)
                .await?;
        let value = complete_json(state.provider.as_ref(), &completion).await?;
        check_payload(KIND, &value, validate_outline)
    }
    .await;

    let elapsed = started.elapsed();
    let status = match &result {
        Ok(outline) => {
            tracing::info!(
                latency_ms = elapsed.as_millis() as u64,
                headings = outline.structure.len(),
                "Outline generated"
            );
            "success"
        }
        Err(e) => failure_label(e),
    };
    record_generation(KIND.as_str(), GenerationMode::Buffered.as_str(), status, elapsed);
    result
}

/// Generate an outline as relay events.
///
/// Everything, template lookup included, happens inside the stream so
/// that every failure arrives as an in-band error event.
pub fn stream_outline(
    state: &AppState,
    request: OutlineRequest,
) -> impl Stream<Item = RelayEvent> + Send + 'static {
    let store = state.store.clone();
    let provider = state.provider.clone();
    let settings = state.generation.clone();
    let provider_id = provider.provider_id().to_string();

    tracing::info!(
        provider = %provider_id,
        model = provider.model_id(),
        audience = %request.audience,
        "Streaming outline"
    );

    let open = async move {
        let completion =
            outline_completion(&store, &settings, &request, GenerationMode::Stream).await?;
        provider.complete_stream(&completion).await
    };
    let finalize_provider = provider_id.clone();
    let finalize = move |raw: &str| finalize_payload(KIND, &finalize_provider, raw, validate_outline);

    relay_events(KIND, provider_id, open, finalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_core::{Audience, Tone};

    fn request() -> OutlineRequest {
        OutlineRequest {
            purpose: "Brief leadership".to_string(),
            topic: "Q3 sales".to_string(),
            audience: Audience::GeneralPublic,
            content: "Revenue grew.".to_string(),
            tone: None,
        }
    }

    #[test]
    fn test_outline_fields_use_audience_label() {
        let fields = outline_fields(&request());
        assert_eq!(fields.get("audience"), Some("general public"));
        assert_eq!(fields.get("purpose"), Some("Brief leadership"));
        assert!(!fields.contains("tone"));
    }

    #[test]
    fn test_outline_fields_include_tone_when_given() {
        let mut req = request();
        req.tone = Some(Tone::Explanatory);
        let fields = outline_fields(&req);
        assert_eq!(fields.get("tone"), Some("explanatory, explanation-focused"));
    }

    #[tokio::test]
    async fn test_outline_completion_renders_default_template() -> ScrivenerResult<()> {
        let store = PromptStore::in_memory().await?;
        let completion = outline_completion(
            &store,
            &GenerationSettings::default(),
            &request(),
            GenerationMode::Buffered,
        )
        .await?;
        assert_eq!(completion.system.as_deref(), Some(KIND.system_instruction()));
        assert!(completion.user.contains("Topic: Q3 sales"));
        assert!(completion.user.contains("Audience: general public"));
        assert!(!completion.user.contains("{{"));
        assert!(completion.options.json_response);
        Ok(())
    }
}
