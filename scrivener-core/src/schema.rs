//! Structural validation of model output.
//!
//! The completion service is asked for JSON but nothing enforces a shape, so
//! every payload goes through these checks before it becomes a typed result.
//! Failures carry a JSON path (`$.structure[1].heading`) naming the first
//! offending value.

use serde_json::{Map, Value};

use crate::entities::{OutlineResult, OutlineSection, ReportItem, ReportResult, ReportSection};
use crate::error::ResponseError;

/// Parse a raw model payload into a JSON object.
pub fn parse_payload(raw: &str) -> Result<Value, ResponseError> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| ResponseError::Unparseable {
        reason: e.to_string(),
        raw: raw.to_string(),
    })?;
    if !value.is_object() {
        return Err(ResponseError::Unparseable {
            reason: format!("expected a JSON object, got {}", kind_of(&value)),
            raw: raw.to_string(),
        });
    }
    Ok(value)
}

/// Validate an outline payload.
///
/// Requires a string `title` and a non-empty `structure` array whose items
/// each have a non-blank `heading`. `subheadings` may be absent or null.
pub fn validate_outline(value: &Value) -> Result<OutlineResult, ResponseError> {
    let root = as_object(value, "$")?;
    let title = required_str(root, "title", "$")?;
    let structure = required_array(root, "structure", "$")?;
    if structure.is_empty() {
        return Err(invalid("$.structure", "must contain at least one heading"));
    }

    let mut sections = Vec::with_capacity(structure.len());
    for (i, item) in structure.iter().enumerate() {
        let path = format!("$.structure[{}]", i);
        let obj = as_object(item, &path)?;
        let heading = required_str(obj, "heading", &path)?;
        if heading.trim().is_empty() {
            return Err(invalid(&format!("{}.heading", path), "must not be blank"));
        }
        let subheadings = match obj.get("subheadings") {
            None | Some(Value::Null) => None,
            Some(v) => Some(string_array(v, &format!("{}.subheadings", path))?),
        };
        sections.push(OutlineSection {
            heading: heading.to_string(),
            subheadings,
        });
    }

    Ok(OutlineResult {
        title: title.to_string(),
        structure: sections,
    })
}

/// Validate a report payload.
///
/// Each item needs a `heading` plus either `sections` (nested) or `content`
/// (flat). A bare string `content` is taken as a single paragraph.
pub fn validate_report(value: &Value) -> Result<ReportResult, ResponseError> {
    let root = as_object(value, "$")?;
    let title = required_str(root, "title", "$")?;
    let items = required_array(root, "report", "$")?;
    if items.is_empty() {
        return Err(invalid("$.report", "must contain at least one item"));
    }

    let mut report = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("$.report[{}]", i);
        let obj = as_object(item, &path)?;
        let heading = required_str(obj, "heading", &path)?.to_string();

        let parsed = match obj.get("sections") {
            Some(Value::Array(raw_sections)) => {
                let mut sections = Vec::with_capacity(raw_sections.len());
                for (j, section) in raw_sections.iter().enumerate() {
                    let spath = format!("{}.sections[{}]", path, j);
                    let sobj = as_object(section, &spath)?;
                    let subheading = required_str(sobj, "subheading", &spath)?.to_string();
                    let content = paragraphs(sobj, &spath)?;
                    sections.push(ReportSection {
                        subheading,
                        content,
                    });
                }
                ReportItem::Nested { heading, sections }
            }
            Some(Value::Null) | None => ReportItem::Flat {
                content: paragraphs(obj, &path)?,
                heading,
            },
            Some(other) => {
                return Err(invalid(
                    &format!("{}.sections", path),
                    &format!("expected array, got {}", kind_of(other)),
                ))
            }
        };
        report.push(parsed);
    }

    Ok(ReportResult {
        title: title.to_string(),
        report,
    })
}

/// Parse and validate an outline in one step.
pub fn parse_outline(raw: &str) -> Result<OutlineResult, ResponseError> {
    validate_outline(&parse_payload(raw)?)
}

/// Parse and validate a report in one step.
pub fn parse_report(raw: &str) -> Result<ReportResult, ResponseError> {
    validate_report(&parse_payload(raw)?)
}

// ============================================================================
// HELPERS
// ============================================================================

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid(path: &str, reason: &str) -> ResponseError {
    ResponseError::InvalidField {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ResponseError> {
    value
        .as_object()
        .ok_or_else(|| invalid(path, &format!("expected object, got {}", kind_of(value))))
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<&'a Value, ResponseError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(ResponseError::MissingField {
            path: format!("{}.{}", parent, key),
        }),
        Some(v) => Ok(v),
    }
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<&'a str, ResponseError> {
    let v = required(obj, key, parent)?;
    v.as_str().ok_or_else(|| {
        invalid(
            &format!("{}.{}", parent, key),
            &format!("expected string, got {}", kind_of(v)),
        )
    })
}

fn required_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<&'a Vec<Value>, ResponseError> {
    let v = required(obj, key, parent)?;
    v.as_array().ok_or_else(|| {
        invalid(
            &format!("{}.{}", parent, key),
            &format!("expected array, got {}", kind_of(v)),
        )
    })
}

fn string_array(value: &Value, path: &str) -> Result<Vec<String>, ResponseError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(path, &format!("expected array, got {}", kind_of(value))))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                invalid(
                    &format!("{}[{}]", path, i),
                    &format!("expected string, got {}", kind_of(item)),
                )
            })
        })
        .collect()
}

fn paragraphs(obj: &Map<String, Value>, parent: &str) -> Result<Vec<String>, ResponseError> {
    let v = required(obj, "content", parent)?;
    match v {
        Value::String(s) => Ok(vec![s.clone()]),
        other => string_array(other, &format!("{}.content", parent)),
    }
}
