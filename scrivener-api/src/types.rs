//! Request and response bodies for the HTTP layer.
//!
//! Generation payloads arrive with every field optional so that a missing
//! or blank field is reported by name instead of as a generic body error.

use scrivener_core::{
    validate_outline, Audience, OutlineRequest, ReportRequest, Tone, ValidationError,
};
use serde::{Deserialize, Serialize};

use crate::constants::STREAM_QUERY_TRUE;

// ============================================================================
// FIELD HELPERS
// ============================================================================

fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        }),
    }
}

fn parse_audience(value: &str) -> Result<Audience, ValidationError> {
    Audience::from_db_str(value.trim()).map_err(|e| ValidationError::InvalidValue {
        field: "audience".to_string(),
        reason: e.to_string(),
    })
}

fn parse_tone(value: &str) -> Result<Tone, ValidationError> {
    Tone::from_db_str(value.trim()).map_err(|e| ValidationError::InvalidValue {
        field: "tone".to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// GENERATION PAYLOADS
// ============================================================================

/// Body of `POST /api/v1/outline`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OutlinePayload {
    /// Why the report is being written
    pub purpose: Option<String>,
    pub topic: Option<String>,
    /// One of internal_team, executives, clients, general_public
    pub audience: Option<String>,
    /// Source material the outline is built from
    pub content: Option<String>,
    /// One of formal, professional, analytical, explanatory
    pub tone: Option<String>,
}

impl OutlinePayload {
    /// Check required fields and parse the enums.
    ///
    /// Fields are checked in wire order, so the first missing one is named.
    pub fn into_request(self) -> Result<OutlineRequest, ValidationError> {
        let purpose = required("purpose", self.purpose)?;
        let topic = required("topic", self.topic)?;
        let audience = parse_audience(&required("audience", self.audience)?)?;
        let content = required("content", self.content)?;
        let tone = match self.tone {
            Some(t) if !t.trim().is_empty() => Some(parse_tone(&t)?),
            _ => None,
        };

        Ok(OutlineRequest {
            purpose,
            topic,
            audience,
            content,
            tone,
        })
    }
}

/// Body of `POST /api/v1/report`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    /// The outline to expand, usually as returned by the outline endpoint
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub title_structure: Option<serde_json::Value>,
    pub audience: Option<String>,
    pub content: Option<String>,
    pub tone: Option<String>,
}

impl ReportPayload {
    /// Check required fields; the outline must satisfy the same rules as a
    /// generated one.
    pub fn into_request(self) -> Result<ReportRequest, ValidationError> {
        let title_structure = match self.title_structure {
            Some(value) if !value.is_null() => {
                validate_outline(&value).map_err(|e| ValidationError::InvalidValue {
                    field: "titleStructure".to_string(),
                    reason: e.to_string(),
                })?
            }
            _ => {
                return Err(ValidationError::RequiredFieldMissing {
                    field: "titleStructure".to_string(),
                })
            }
        };
        let audience = parse_audience(&required("audience", self.audience)?)?;
        let content = required("content", self.content)?;
        let tone = parse_tone(&required("tone", self.tone)?)?;

        Ok(ReportRequest {
            title_structure,
            audience,
            content,
            tone,
        })
    }
}

/// Query string accepted by the generation endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct GenerateQuery {
    /// `true` or `1` selects a server-sent-event response
    pub stream: Option<String>,
}

impl GenerateQuery {
    pub fn wants_stream(&self) -> bool {
        self.stream
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case(STREAM_QUERY_TRUE) || s == "1")
            .unwrap_or(false)
    }
}

// ============================================================================
// GENERIC RESPONSES
// ============================================================================

/// Acknowledgement for mutations that return no entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outline_payload() -> OutlinePayload {
        OutlinePayload {
            purpose: Some("Brief leadership".to_string()),
            topic: Some("Q3 sales".to_string()),
            audience: Some("executives".to_string()),
            content: Some("Revenue grew 12%.".to_string()),
            tone: None,
        }
    }

    fn missing_field<T: std::fmt::Debug>(result: Result<T, ValidationError>) -> String {
        match result {
            Err(ValidationError::RequiredFieldMissing { field }) => field,
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_outline_payload_valid() {
        let request = outline_payload().into_request().expect("valid");
        assert_eq!(request.audience, Audience::Executives);
        assert_eq!(request.tone, None);
    }

    #[test]
    fn test_outline_payload_blank_content_is_missing() {
        let mut payload = outline_payload();
        payload.content = Some("   \n".to_string());
        assert_eq!(missing_field(payload.into_request()), "content");

        let mut payload = outline_payload();
        payload.purpose = None;
        assert_eq!(missing_field(payload.into_request()), "purpose");
    }

    #[test]
    fn test_outline_payload_rejects_unknown_audience() {
        let mut payload = outline_payload();
        payload.audience = Some("martians".to_string());
        assert!(matches!(
            payload.into_request(),
            Err(ValidationError::InvalidValue { ref field, .. }) if field == "audience"
        ));
    }

    #[test]
    fn test_outline_payload_blank_tone_is_absent() {
        let mut payload = outline_payload();
        payload.tone = Some(" ".to_string());
        assert_eq!(payload.into_request().expect("valid").tone, None);
    }

    #[test]
    fn test_report_payload_requires_every_field() {
        let full = ReportPayload {
            title_structure: Some(json!({"title": "T", "structure": [{"heading": "H"}]})),
            audience: Some("clients".to_string()),
            content: Some("body".to_string()),
            tone: Some("formal".to_string()),
        };
        let request = full.clone().into_request().expect("valid");
        assert_eq!(request.title_structure.title, "T");
        assert_eq!(request.tone, Tone::Formal);

        let mut payload = full.clone();
        payload.title_structure = Some(serde_json::Value::Null);
        assert_eq!(missing_field(payload.into_request()), "titleStructure");

        let mut payload = full;
        payload.tone = None;
        assert_eq!(missing_field(payload.into_request()), "tone");
    }

    #[test]
    fn test_report_payload_rejects_malformed_outline() {
        let payload = ReportPayload {
            title_structure: Some(json!({"title": "T", "structure": []})),
            audience: Some("clients".to_string()),
            content: Some("body".to_string()),
            tone: Some("formal".to_string()),
        };
        assert!(matches!(
            payload.into_request(),
            Err(ValidationError::InvalidValue { ref field, .. }) if field == "titleStructure"
        ));
    }

    #[test]
    fn test_generate_query_stream_flag() {
        let q = |s: Option<&str>| GenerateQuery {
            stream: s.map(String::from),
        };
        assert!(q(Some("true")).wants_stream());
        assert!(q(Some("TRUE")).wants_stream());
        assert!(q(Some("1")).wants_stream());
        assert!(!q(Some("false")).wants_stream());
        assert!(!q(None).wants_stream());
    }
}
