//! LMDB-backed prompt storage.
//!
//! Uses the heed crate (Rust bindings for LMDB). Each template is stored as
//! JSON under its id in a single unnamed database. Reads use read
//! transactions; `put` and `replace_all` each run in one write transaction,
//! so a reset is never observed half-applied.

use std::path::Path;

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use scrivener_core::{PromptTemplate, ScrivenerError, ScrivenerResult, StorageError};

use crate::backend::PromptBackend;

/// Error type for LMDB operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbPromptError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Requested map size does not fit in the address space.
    #[error("Map size of {max_size_mb} MB is too large")]
    MapSize { max_size_mb: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbPromptError> for ScrivenerError {
    fn from(e: LmdbPromptError) -> Self {
        let operation = match &e {
            LmdbPromptError::EnvOpen(_)
            | LmdbPromptError::MapSize { .. }
            | LmdbPromptError::Io(_) => "open",
            LmdbPromptError::DbOpen(_) => "create_database",
            LmdbPromptError::Transaction(_) => "transaction",
        };
        ScrivenerError::Storage(StorageError::Backend {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }
}

fn txn_err(e: heed::Error) -> LmdbPromptError {
    LmdbPromptError::Transaction(e.to_string())
}

fn decode(id: &[u8], bytes: &[u8]) -> Result<PromptTemplate, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization {
        id: String::from_utf8_lossy(id).into_owned(),
        reason: e.to_string(),
    })
}

fn encode(template: &PromptTemplate) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(template).map_err(|e| StorageError::Serialization {
        id: template.id.clone(),
        reason: e.to_string(),
    })
}

/// Durable prompt backend.
pub struct LmdbPromptBackend {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbPromptBackend {
    /// Open (or create) the store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbPromptError> {
        let map_size = max_size_mb
            .max(1)
            .checked_mul(1024 * 1024)
            .ok_or(LmdbPromptError::MapSize { max_size_mb })?;
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per path by this process and
        // never while another handle to the same files is alive.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbPromptError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbPromptError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        tracing::info!(path = %path.as_ref().display(), max_size_mb, "Opened LMDB prompt store");

        Ok(Self { env, db })
    }
}

#[async_trait]
impl PromptBackend for LmdbPromptBackend {
    fn name(&self) -> &'static str {
        "lmdb"
    }

    async fn list(&self) -> ScrivenerResult<Vec<PromptTemplate>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let iter = self.db.iter(&rtxn).map_err(txn_err)?;

        let mut templates = Vec::new();
        for entry in iter {
            let (key, value) = entry.map_err(txn_err)?;
            templates.push(decode(key, value)?);
        }
        Ok(templates)
    }

    async fn get(&self, id: &str) -> ScrivenerResult<Option<PromptTemplate>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        match self.db.get(&rtxn, id.as_bytes()).map_err(txn_err)? {
            Some(bytes) => Ok(Some(decode(id.as_bytes(), bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, template: &PromptTemplate) -> ScrivenerResult<()> {
        let bytes = encode(template)?;
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, template.id.as_bytes(), &bytes)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn replace_all(&self, templates: &[PromptTemplate]) -> ScrivenerResult<()> {
        let encoded = templates
            .iter()
            .map(|t| encode(t).map(|bytes| (t.id.as_bytes(), bytes)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.clear(&mut wtxn).map_err(txn_err)?;
        for (key, bytes) in &encoded {
            self.db.put(&mut wtxn, key, bytes).map_err(txn_err)?;
        }
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }
}

impl std::fmt::Debug for LmdbPromptBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbPromptBackend")
            .field("path", &self.env.path())
            .finish()
    }
}
