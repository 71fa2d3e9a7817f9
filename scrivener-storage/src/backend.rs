//! Backend abstraction for prompt template persistence.

use async_trait::async_trait;
use scrivener_core::{PromptTemplate, ScrivenerResult};

/// Persistence for prompt templates, keyed by template id.
///
/// Backends hold no policy: seeding, defaults and update semantics live in
/// [`crate::PromptStore`].
#[async_trait]
pub trait PromptBackend: Send + Sync {
    /// Short backend name for logs ("memory", "lmdb").
    fn name(&self) -> &'static str;

    /// All stored templates ordered by id.
    async fn list(&self) -> ScrivenerResult<Vec<PromptTemplate>>;

    /// One template by id.
    async fn get(&self, id: &str) -> ScrivenerResult<Option<PromptTemplate>>;

    /// Insert or overwrite a template.
    async fn put(&self, template: &PromptTemplate) -> ScrivenerResult<()>;

    /// Atomically replace every stored template with `templates`.
    async fn replace_all(&self, templates: &[PromptTemplate]) -> ScrivenerResult<()>;
}
