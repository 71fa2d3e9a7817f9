//! Enum types shared by requests, templates and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PROMPT TYPE
// ============================================================================

/// Which generation step a prompt template drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    /// Title and heading structure
    Outline,
    /// Full report body
    Report,
}

impl PromptType {
    /// Convert to stored string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Report => "report",
        }
    }

    /// Parse from stored string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s {
            "outline" => Ok(Self::Outline),
            "report" => Ok(Self::Report),
            _ => Err(EnumParseError::new("prompt type", s)),
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ============================================================================
// AUDIENCE
// ============================================================================

/// Primary readership of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    InternalTeam,
    Executives,
    Clients,
    GeneralPublic,
}

impl Audience {
    pub const ALL: [Audience; 4] = [
        Self::InternalTeam,
        Self::Executives,
        Self::Clients,
        Self::GeneralPublic,
    ];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::InternalTeam => "internal_team",
            Self::Executives => "executives",
            Self::Clients => "clients",
            Self::GeneralPublic => "general_public",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s {
            "internal_team" => Ok(Self::InternalTeam),
            "executives" => Ok(Self::Executives),
            "clients" => Ok(Self::Clients),
            "general_public" => Ok(Self::GeneralPublic),
            _ => Err(EnumParseError::new("audience", s)),
        }
    }

    /// Phrase substituted into prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InternalTeam => "internal team",
            Self::Executives => "executives",
            Self::Clients => "clients",
            Self::GeneralPublic => "general public",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ============================================================================
// TONE
// ============================================================================

/// Writing style requested for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Professional,
    Analytical,
    Explanatory,
}

impl Tone {
    pub const ALL: [Tone; 4] = [
        Self::Formal,
        Self::Professional,
        Self::Analytical,
        Self::Explanatory,
    ];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Professional => "professional",
            Self::Analytical => "analytical",
            Self::Explanatory => "explanatory",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s {
            "formal" => Ok(Self::Formal),
            "professional" => Ok(Self::Professional),
            "analytical" => Ok(Self::Analytical),
            "explanatory" => Ok(Self::Explanatory),
            _ => Err(EnumParseError::new("tone", s)),
        }
    }

    /// Phrase substituted into prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Professional => "professional",
            Self::Analytical => "analytical",
            Self::Explanatory => "explanatory, explanation-focused",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Error parsing one of the enums above from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}
