//! Value objects exchanged across the process boundary.
//!
//! All of these serialize with camelCase keys, which is the wire format the
//! HTTP layer and stored templates share.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Audience, PromptType, Tone};

// ============================================================================
// PROMPT TEMPLATES
// ============================================================================

/// An editable prompt template with `{{field}}` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromptTemplate {
    /// Apply a partial update. `updated_at` is always refreshed, even when
    /// the update carries no fields.
    pub fn apply(&mut self, update: &PromptUpdate, now: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(content) = &update.content {
            self.content = content.clone();
        }
        self.updated_at = now;
    }
}

/// Partial update for a prompt template. Identity and type are immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PromptUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ============================================================================
// OUTLINE
// ============================================================================

/// Validated input for the outline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OutlineRequest {
    pub purpose: String,
    pub topic: String,
    pub audience: Audience,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
}

/// One top-level heading of an outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OutlineSection {
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheadings: Option<Vec<String>>,
}

/// Proposed title and heading structure of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OutlineResult {
    pub title: String,
    pub structure: Vec<OutlineSection>,
}

// ============================================================================
// REPORT
// ============================================================================

/// Validated input for the report step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub title_structure: OutlineResult,
    pub audience: Audience,
    pub content: String,
    pub tone: Tone,
}

/// A subsection of a nested report item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReportSection {
    pub subheading: String,
    pub content: Vec<String>,
}

/// One top-level heading of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum ReportItem {
    /// Heading with subsections
    Nested {
        heading: String,
        sections: Vec<ReportSection>,
    },
    /// Heading with paragraphs directly beneath it
    Flat { heading: String, content: Vec<String> },
}

impl ReportItem {
    pub fn heading(&self) -> &str {
        match self {
            Self::Nested { heading, .. } | Self::Flat { heading, .. } => heading,
        }
    }
}

/// The generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReportResult {
    pub title: String,
    pub report: Vec<ReportItem>,
}

impl ReportResult {
    /// Whether the last item is a references section.
    ///
    /// The prompt asks for one; nothing enforces it.
    pub fn has_references(&self) -> bool {
        self.report
            .last()
            .map(|item| item.heading().trim().eq_ignore_ascii_case("references"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn template() -> PromptTemplate {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        PromptTemplate {
            id: "outline-default".to_string(),
            name: "Outline".to_string(),
            description: "desc".to_string(),
            content: "{{topic}}".to_string(),
            prompt_type: PromptType::Outline,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_prompt_template_wire_format() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(template())?;
        assert_eq!(json["type"], "outline");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("prompt_type").is_none());
        Ok(())
    }

    #[test]
    fn test_apply_update_refreshes_timestamp() {
        let mut t = template();
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        t.apply(
            &PromptUpdate {
                content: Some("new".to_string()),
                ..Default::default()
            },
            later,
        );
        assert_eq!(t.content, "new");
        assert_eq!(t.name, "Outline");
        assert_eq!(t.updated_at, later);
        assert_ne!(t.created_at, later);
    }

    #[test]
    fn test_report_item_untagged_shapes() -> Result<(), serde_json::Error> {
        let flat = ReportItem::Flat {
            heading: "Intro".to_string(),
            content: vec!["p1".to_string()],
        };
        let json = serde_json::to_value(&flat)?;
        assert_eq!(json, serde_json::json!({"heading": "Intro", "content": ["p1"]}));

        let nested: ReportItem = serde_json::from_value(serde_json::json!({
            "heading": "Body",
            "sections": [{"subheading": "A", "content": ["x"]}]
        }))?;
        assert!(matches!(nested, ReportItem::Nested { .. }));
        assert_eq!(nested.heading(), "Body");
        Ok(())
    }

    #[test]
    fn test_report_request_uses_title_structure_key() -> Result<(), serde_json::Error> {
        let req = ReportRequest {
            title_structure: OutlineResult {
                title: "T".to_string(),
                structure: vec![OutlineSection {
                    heading: "H".to_string(),
                    subheadings: None,
                }],
            },
            audience: Audience::Executives,
            content: "c".to_string(),
            tone: Tone::Formal,
        };
        let json = serde_json::to_value(&req)?;
        assert!(json.get("titleStructure").is_some());
        assert!(json["titleStructure"]["structure"][0].get("subheadings").is_none());
        Ok(())
    }

    #[test]
    fn test_has_references() {
        let mut report = ReportResult {
            title: "T".to_string(),
            report: vec![ReportItem::Flat {
                heading: "Summary".to_string(),
                content: vec![],
            }],
        };
        assert!(!report.has_references());
        report.report.push(ReportItem::Flat {
            heading: "References".to_string(),
            content: vec!["(OECD, 2023)".to_string()],
        });
        assert!(report.has_references());
    }
}
