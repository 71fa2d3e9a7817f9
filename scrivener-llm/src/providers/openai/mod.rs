//! OpenAI provider implementation
//!
//! Chat completions in buffered and streaming form.

pub mod client;
pub mod completion;
pub mod stream;
pub mod types;

pub use client::OpenAIClient;
pub use completion::OpenAICompletionProvider;
