//! Scrivener Storage - Prompt Template Store
//!
//! `PromptStore` over an injectable `PromptBackend`: process memory for tests
//! and ephemeral deployments, LMDB when templates must survive restarts.

pub mod backend;
pub mod lmdb;
pub mod memory;
pub mod store;

pub use backend::PromptBackend;
pub use lmdb::{LmdbPromptBackend, LmdbPromptError};
pub use memory::InMemoryPromptBackend;
pub use store::PromptStore;
