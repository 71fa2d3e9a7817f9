//! The prompt store: defaults, lookup by type and partial updates.

use std::sync::Arc;

use chrono::Utc;
use scrivener_core::{default_prompts, PromptTemplate, PromptType, PromptUpdate, ScrivenerResult};
use tokio::sync::Mutex;

use crate::backend::PromptBackend;
use crate::memory::InMemoryPromptBackend;

/// Prompt template store shared through application state.
///
/// Writes are serialized inside the process so a concurrent update and reset
/// never interleave; across processes the last write wins.
pub struct PromptStore {
    backend: Arc<dyn PromptBackend>,
    write_lock: Mutex<()>,
}

impl PromptStore {
    /// Wrap `backend`, seeding the built-in defaults when it is empty.
    pub async fn open(backend: Arc<dyn PromptBackend>) -> ScrivenerResult<Self> {
        let store = Self {
            backend,
            write_lock: Mutex::new(()),
        };
        if store.backend.list().await?.is_empty() {
            tracing::info!(backend = store.backend.name(), "Seeding default prompts");
            store.backend.replace_all(&default_prompts(Utc::now())).await?;
        }
        Ok(store)
    }

    /// Store over a fresh in-memory backend.
    pub async fn in_memory() -> ScrivenerResult<Self> {
        Self::open(Arc::new(InMemoryPromptBackend::new())).await
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn get_all(&self) -> ScrivenerResult<Vec<PromptTemplate>> {
        self.backend.list().await
    }

    /// First template of the given type, if any.
    pub async fn get_by_type(&self, prompt_type: PromptType) -> ScrivenerResult<Option<PromptTemplate>> {
        Ok(self
            .backend
            .list()
            .await?
            .into_iter()
            .find(|t| t.prompt_type == prompt_type))
    }

    pub async fn get(&self, id: &str) -> ScrivenerResult<Option<PromptTemplate>> {
        self.backend.get(id).await
    }

    /// Apply `update` to the template with `id`.
    ///
    /// Returns `Ok(false)` and writes nothing when the id is unknown.
    pub async fn update(&self, id: &str, update: &PromptUpdate) -> ScrivenerResult<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut template) = self.backend.get(id).await? else {
            tracing::debug!(prompt_id = id, "Update for unknown prompt ignored");
            return Ok(false);
        };
        template.apply(update, Utc::now());
        self.backend.put(&template).await?;
        tracing::info!(prompt_id = id, "Prompt updated");
        Ok(true)
    }

    /// Replace every template with the built-in defaults.
    pub async fn reset(&self) -> ScrivenerResult<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.replace_all(&default_prompts(Utc::now())).await?;
        tracing::info!(backend = self.backend.name(), "Prompts reset to defaults");
        Ok(())
    }
}

impl std::fmt::Debug for PromptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lmdb::LmdbPromptBackend;
    use proptest::prelude::*;
    use scrivener_core::{OUTLINE_DEFAULT_ID, REPORT_DEFAULT_ID};

    fn ids(templates: &[PromptTemplate]) -> Vec<&str> {
        templates.iter().map(|t| t.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_open_seeds_defaults() -> ScrivenerResult<()> {
        let store = PromptStore::in_memory().await?;
        let all = store.get_all().await?;
        assert_eq!(ids(&all), vec![OUTLINE_DEFAULT_ID, REPORT_DEFAULT_ID]);
        Ok(())
    }

    #[tokio::test]
    async fn test_open_keeps_existing_templates() -> ScrivenerResult<()> {
        let backend = Arc::new(InMemoryPromptBackend::new());
        let mut custom = default_prompts(Utc::now()).remove(0);
        custom.id = "outline-custom".to_string();
        backend.put(&custom).await?;

        let store = PromptStore::open(backend).await?;
        let all = store.get_all().await?;
        assert_eq!(ids(&all), vec!["outline-custom"]);
        assert!(store.get_by_type(PromptType::Report).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_existing() -> ScrivenerResult<()> {
        let store = PromptStore::in_memory().await?;
        let before = store.get(OUTLINE_DEFAULT_ID).await?.expect("seeded");

        let updated = store
            .update(
                OUTLINE_DEFAULT_ID,
                &PromptUpdate {
                    content: Some("Topic: {{topic}}".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        assert!(updated);

        let after = store.get(OUTLINE_DEFAULT_ID).await?.expect("still there");
        assert_eq!(after.content, "Topic: {{topic}}");
        assert_eq!(after.name, before.name);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_id_changes_nothing() -> ScrivenerResult<()> {
        let store = PromptStore::in_memory().await?;
        let before = store.get_all().await?;
        let updated = store
            .update(
                "does-not-exist",
                &PromptUpdate {
                    name: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        assert!(!updated);
        assert_eq!(store.get_all().await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() -> ScrivenerResult<()> {
        let store = PromptStore::in_memory().await?;
        store
            .update(
                OUTLINE_DEFAULT_ID,
                &PromptUpdate {
                    content: Some("edited".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        store.reset().await?;

        let all = store.get_all().await?;
        assert_eq!(ids(&all), vec![OUTLINE_DEFAULT_ID, REPORT_DEFAULT_ID]);
        let outline = store.get_by_type(PromptType::Outline).await?.expect("outline");
        assert_eq!(outline.id, OUTLINE_DEFAULT_ID);
        assert_ne!(outline.content, "edited");
        Ok(())
    }

    #[tokio::test]
    async fn test_lmdb_backed_store_persists_updates() -> ScrivenerResult<()> {
        let dir = tempfile::TempDir::new().expect("temp dir");
        {
            let backend = Arc::new(LmdbPromptBackend::open(dir.path(), 10)?);
            let store = PromptStore::open(backend).await?;
            assert!(
                store
                    .update(
                        REPORT_DEFAULT_ID,
                        &PromptUpdate {
                            description: Some("tuned".to_string()),
                            ..Default::default()
                        },
                    )
                    .await?
            );
        }
        let backend = Arc::new(LmdbPromptBackend::open(dir.path(), 10)?);
        let store = PromptStore::open(backend).await?;
        let report = store.get(REPORT_DEFAULT_ID).await?.expect("persisted");
        assert_eq!(report.description, "tuned");
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_unknown_ids_never_mutate(id in "[a-z]{1,12}-[0-9]{1,4}") {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async {
                let store = PromptStore::in_memory().await.expect("store");
                let before = store.get_all().await.expect("list");
                let changed = store
                    .update(&id, &PromptUpdate { content: Some("x".into()), ..Default::default() })
                    .await
                    .expect("update");
                assert!(!changed);
                assert_eq!(store.get_all().await.expect("list"), before);
            });
        }
    }
}
