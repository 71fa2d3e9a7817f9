//! Process-memory prompt backend. Not durable across restarts.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use scrivener_core::{PromptTemplate, ScrivenerResult, StorageError};

use crate::backend::PromptBackend;

#[derive(Debug, Default)]
pub struct InMemoryPromptBackend {
    templates: RwLock<BTreeMap<String, PromptTemplate>>,
}

impl InMemoryPromptBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromptBackend for InMemoryPromptBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> ScrivenerResult<Vec<PromptTemplate>> {
        let templates = self
            .templates
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(templates.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> ScrivenerResult<Option<PromptTemplate>> {
        let templates = self
            .templates
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(templates.get(id).cloned())
    }

    async fn put(&self, template: &PromptTemplate) -> ScrivenerResult<()> {
        let mut templates = self
            .templates
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        templates.insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn replace_all(&self, replacement: &[PromptTemplate]) -> ScrivenerResult<()> {
        let mut templates = self
            .templates
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        *templates = replacement
            .iter()
            .map(|t| (t.id.clone(), t.clone()))
            .collect();
        Ok(())
    }
}
