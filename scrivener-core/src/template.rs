//! `{{field}}` substitution for prompt templates.
//!
//! Substitution is a single left-to-right pass over the template. Field
//! values are inserted verbatim and never rescanned, so a value that itself
//! looks like a token stays literal. Tokens with no matching field are left
//! in place.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("token pattern is a valid regex")
});

/// Named values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFields {
    values: BTreeMap<String, String>,
}

impl TemplateFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// Substitute every known token in `template`.
pub fn render(template: &str, fields: &TemplateFields) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures<'_>| match fields.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct token names referenced by `template`, in sorted order.
pub fn placeholders(template: &str) -> BTreeSet<String> {
    TOKEN
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Token names referenced by `template` that `fields` does not provide.
pub fn unresolved(template: &str, fields: &TemplateFields) -> Vec<String> {
    placeholders(template)
        .into_iter()
        .filter(|name| !fields.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_render_replaces_every_occurrence() {
        let fields = TemplateFields::new().with("topic", "X");
        assert_eq!(
            render("Topic: {{topic}}, again {{topic}}", &fields),
            "Topic: X, again X"
        );
    }

    #[test]
    fn test_render_leaves_unknown_tokens() {
        let fields = TemplateFields::new().with("topic", "X");
        assert_eq!(
            render("{{topic}} for {{audience}}", &fields),
            "X for {{audience}}"
        );
    }

    #[test]
    fn test_render_is_single_pass() {
        let fields = TemplateFields::new()
            .with("a", "{{b}}")
            .with("b", "nope");
        assert_eq!(render("[{{a}}]", &fields), "[{{b}}]");
    }

    #[test]
    fn test_render_does_not_escape_values() {
        let fields = TemplateFields::new().with("content", "<b>\"quoted\" & $1</b>");
        assert_eq!(render("{{content}}", &fields), "<b>\"quoted\" & $1</b>");
    }

    #[test]
    fn test_placeholders_and_unresolved() {
        let template = "{{purpose}} {{topic}} {{topic}} {{ spaced }} {{style}}";
        let names: Vec<String> = placeholders(template).into_iter().collect();
        assert_eq!(names, vec!["purpose", "style", "topic"]);

        let fields: TemplateFields = [("purpose", "p"), ("topic", "t")].into_iter().collect();
        assert_eq!(unresolved(template, &fields), vec!["style".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_render_without_tokens_is_identity(s in "[^{}]*") {
            let fields = TemplateFields::new().with("topic", "X");
            prop_assert_eq!(render(&s, &fields), s);
        }

        #[test]
        fn prop_render_is_idempotent_once_resolved(
            prefix in "[a-z ]{0,20}",
            value in "[A-Za-z0-9 .,]{0,40}",
        ) {
            let fields = TemplateFields::new().with("topic", value);
            let template = format!("{prefix}{{{{topic}}}}{prefix}");
            let once = render(&template, &fields);
            prop_assert_eq!(render(&once, &fields), once.clone());
            prop_assert!(placeholders(&once).is_empty());
        }
    }
}
