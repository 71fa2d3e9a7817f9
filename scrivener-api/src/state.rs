//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use scrivener_llm::CompletionProvider;
use scrivener_storage::PromptStore;

use crate::services::GenerationSettings;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Prompt templates, seeded with the defaults on open.
    pub store: Arc<PromptStore>,
    pub provider: Arc<dyn CompletionProvider>,
    pub generation: GenerationSettings,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<PromptStore>,
        provider: Arc<dyn CompletionProvider>,
        generation: GenerationSettings,
    ) -> Self {
        Self {
            store,
            provider,
            generation,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("provider", &self.provider.provider_id())
            .field("model", &self.provider.model_id())
            .field("generation", &self.generation)
            .finish()
    }
}

crate::impl_from_ref!(Arc<PromptStore>, store);
