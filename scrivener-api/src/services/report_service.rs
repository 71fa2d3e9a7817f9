//! Report Service
//!
//! Expands an outline into a full `ReportResult`. The editorial rules
//! (heading order, executive summary, placeholders for missing figures,
//! references) live in the prompt text, not here.

use std::time::Instant;

use futures_util::Stream;
use scrivener_core::{
    validate_report, ReportRequest, ReportResult, ScrivenerResult, TemplateFields,
    ValidationError,
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

const KIND: GenerationKind = GenerationKind::Report;

/// Template fields for a report prompt.
///
/// The outline is inserted as compact JSON. `style` mirrors `tone` for
/// templates written against the older field name.
pub fn report_fields(request: &ReportRequest) -> ScrivenerResult<TemplateFields> {
    let title_structure = serde_json::to_string(&request.title_structure).map_err(|e| {
        ValidationError::InvalidValue {
            field: "titleStructure".to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(TemplateFields::new()
        .with("titleStructure", title_structure)
        .with("audience", request.audience.label())
        .with("content", request.content.as_str())
        .with("tone", request.tone.label())
        .with("style", request.tone.label()))
}

/// Completion request for `request`, rendered from the stored template.
pub async fn report_completion(
    store: &PromptStore,
    settings: &GenerationSettings,
    request: &ReportRequest,
    mode: GenerationMode,
) -> ScrivenerResult<CompletionRequest> {
    let template = resolve_template(store, KIND).await?;
    let prompt = render_prompt(KIND, &template, &report_fields(request)?);
    Ok(CompletionRequest::new(prompt)
        .with_system(KIND.system_instruction())
        .with_options(settings.options(KIND, mode)))
}

/// Generate a report and wait for the whole result.
pub async fn generate_report(
    state: &AppState,
    request: &ReportRequest,
) -> ScrivenerResult<ReportResult> {
    let started = Instant::now();
    tracing::info!(
        provider = state.provider.provider_id(),
        model = state.provider.model_id(),
        headings = request.title_structure.structure.len(),
        tone = %request.tone,
        "Generating report"
    );

    let result = async {
        let completion =
            report_completion(&state.store, &state.generation, request, GenerationMode::Buffered)
                .await?;
        let value = complete_json(state.provider.as_ref(), &completion).await?;
        check_payload(KIND, &value, validate_report)
    }
    .await;

    let elapsed = started.elapsed();
    let status = match &result {
        Ok(report) => {
            if !report.has_references() {
                tracing::debug!("Report has no References section");
            }
            tracing::info!(
                latency_ms = elapsed.as_millis() as u64,
                items = report.report.len(),
                "Report generated"
            );
            "success"
        }
        Err(e) => failure_label(e),
    };
    record_generation(KIND.as_str(), GenerationMode::Buffered.as_str(), status, elapsed);
    result
}

/// Generate a report as relay events.
pub fn stream_report(
    state: &AppState,
    request: ReportRequest,
) -> impl Stream<Item = RelayEvent> + Send + 'static {
    let store = state.store.clone();
    let provider = state.provider.clone();
    let settings = state.generation.clone();
    let provider_id = provider.provider_id().to_string();

    tracing::info!(
        provider = %provider_id,
        model = provider.model_id(),
        headings = request.title_structure.structure.len(),
        "Streaming report"
    );

    let open = async move {
        let completion =
            report_completion(&store, &settings, &request, GenerationMode::Stream).await?;
        provider.complete_stream(&completion).await
    };
    let finalize_provider = provider_id.clone();
    let finalize = move |raw: &str| finalize_payload(KIND, &finalize_provider, raw, validate_report);

    relay_events(KIND, provider_id, open, finalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scrivener_core::{validate_outline, Audience, OutlineResult, OutlineSection, Tone};
    use scrivener_test_utils::generators::{arb_audience, arb_outline_result, arb_tone};

    fn request() -> ReportRequest {
        ReportRequest {
            title_structure: OutlineResult {
                title: "Annual Review".to_string(),
                structure: vec![OutlineSection {
                    heading: "Summary".to_string(),
                    subheadings: None,
                }],
            },
            audience: Audience::Clients,
            content: "Revenue grew.".to_string(),
            tone: Tone::Analytical,
        }
    }

    #[test]
    fn test_report_fields_serialize_outline() -> ScrivenerResult<()> {
        let fields = report_fields(&request())?;
        assert_eq!(
            fields.get("titleStructure"),
            Some("{\"title\":\"Annual Review\",\"structure\":[{\"heading\":\"Summary\"}]}")
        );
        assert_eq!(fields.get("tone"), Some("analytical"));
        assert_eq!(fields.get("style"), fields.get("tone"));
        assert_eq!(fields.get("audience"), Some("clients"));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_completion_uses_larger_budget() -> ScrivenerResult<()> {
        let store = PromptStore::in_memory().await?;
        let settings = GenerationSettings::default();
        let completion =
            report_completion(&store, &settings, &request(), GenerationMode::Buffered).await?;
        assert_eq!(completion.options.max_tokens, Some(settings.report_max_tokens));
        assert!(completion.user.contains("Annual Review"));
        assert!(!completion.user.contains("{{titleStructure}}"));
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_report_fields_carry_outline_intact(
            outline in arb_outline_result(),
            audience in arb_audience(),
            tone in arb_tone(),
        ) {
            let request = ReportRequest {
                title_structure: outline.clone(),
                audience,
                content: "Source notes.".to_string(),
                tone,
            };
            let fields = report_fields(&request).map_err(|e| TestCaseError::fail(e.to_string()))?;

            let embedded = fields.get("titleStructure").unwrap_or_default();
            let value: serde_json::Value = serde_json::from_str(embedded)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(validate_outline(&value).ok(), Some(outline));
            prop_assert_eq!(fields.get("audience"), Some(audience.label()));
            prop_assert_eq!(fields.get("tone"), Some(tone.label()));
            prop_assert_eq!(fields.get("style"), fields.get("tone"));
        }
    }
}
