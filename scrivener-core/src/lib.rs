//! Scrivener Core - Entity Types
//!
//! Data types shared by every other crate, plus the pure pieces of the
//! generation pipeline: template rendering, response validation and
//! plain-text export. Nothing here performs I/O.

pub mod defaults;
pub mod entities;
pub mod enums;
pub mod error;
pub mod export;
pub mod schema;
pub mod template;

pub use defaults::{
    default_content, default_prompts, OUTLINE_DEFAULT_ID, OUTLINE_SYSTEM_INSTRUCTION,
    REPORT_DEFAULT_ID, REPORT_SYSTEM_INSTRUCTION,
};
pub use entities::{
    OutlineRequest, OutlineResult, OutlineSection, PromptTemplate, PromptUpdate, ReportItem,
    ReportRequest, ReportResult, ReportSection,
};
pub use enums::{Audience, EnumParseError, PromptType, Tone};
pub use error::{
    ConfigError, LlmError, ResponseError, ScrivenerError, ScrivenerResult, StorageError,
    ValidationError,
};
pub use export::export_file_name;
pub use schema::{parse_outline, parse_payload, parse_report, validate_outline, validate_report};
pub use template::{placeholders, render, unresolved, TemplateFields};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
