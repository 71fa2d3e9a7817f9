//! Scrivener Test Utilities
//!
//! Shared test infrastructure for the Scrivener workspace:
//! - Proptest generators for outline and report results
//! - Fixtures: sample results, canned model payloads and streaming mocks

pub use scrivener_core::{
    Audience, OutlineResult, OutlineSection, ReportItem, ReportResult, ReportSection, Tone,
};
pub use scrivener_llm::{MockCompletionProvider, MockReply};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Scrivener types.

    use super::*;
    use proptest::prelude::*;

    /// Non-blank single-line text.
    pub fn arb_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.%-]{0,40}"
    }

    pub fn arb_audience() -> impl Strategy<Value = Audience> {
        prop::sample::select(Audience::ALL.to_vec())
    }

    pub fn arb_tone() -> impl Strategy<Value = Tone> {
        prop::sample::select(Tone::ALL.to_vec())
    }

    pub fn arb_outline_section() -> impl Strategy<Value = OutlineSection> {
        (
            arb_text(),
            prop::option::of(prop::collection::vec(arb_text(), 0..4)),
        )
            .prop_map(|(heading, subheadings)| OutlineSection {
                heading,
                subheadings,
            })
    }

    /// Outline satisfying the structural invariants (non-empty structure,
    /// non-blank headings).
    pub fn arb_outline_result() -> impl Strategy<Value = OutlineResult> {
        (arb_text(), prop::collection::vec(arb_outline_section(), 1..7))
            .prop_map(|(title, structure)| OutlineResult { title, structure })
    }

    pub fn arb_report_section() -> impl Strategy<Value = ReportSection> {
        (arb_text(), prop::collection::vec(arb_text(), 1..3))
            .prop_map(|(subheading, content)| ReportSection {
                subheading,
                content,
            })
    }

    pub fn arb_report_item() -> impl Strategy<Value = ReportItem> {
        prop_oneof![
            (arb_text(), prop::collection::vec(arb_text(), 1..3))
                .prop_map(|(heading, content)| ReportItem::Flat { heading, content }),
            (arb_text(), prop::collection::vec(arb_report_section(), 1..3))
                .prop_map(|(heading, sections)| ReportItem::Nested { heading, sections }),
        ]
    }

    pub fn arb_report_result() -> impl Strategy<Value = ReportResult> {
        (arb_text(), prop::collection::vec(arb_report_item(), 1..6))
            .prop_map(|(title, report)| ReportResult { title, report })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built requests and model payloads.

    use super::*;

    pub fn sample_outline() -> OutlineResult {
        OutlineResult {
            title: "Q3 Sales Results".to_string(),
            structure: vec![
                OutlineSection {
                    heading: "Overview".to_string(),
                    subheadings: Some(vec!["Scope".to_string(), "Method".to_string()]),
                },
                OutlineSection {
                    heading: "Findings".to_string(),
                    subheadings: None,
                },
                OutlineSection {
                    heading: "Recommendations".to_string(),
                    subheadings: Some(vec!["Next quarter".to_string()]),
                },
            ],
        }
    }

    pub fn sample_report() -> ReportResult {
        ReportResult {
            title: "Q3 Sales Results".to_string(),
            report: vec![
                ReportItem::Flat {
                    heading: "Executive Summary".to_string(),
                    content: vec!["Revenue grew 12% (+12% year over year).".to_string()],
                },
                ReportItem::Nested {
                    heading: "Overview".to_string(),
                    sections: vec![ReportSection {
                        subheading: "Scope".to_string(),
                        content: vec!["All regions, July to September.".to_string()],
                    }],
                },
                ReportItem::Flat {
                    heading: "References".to_string(),
                    content: vec!["Internal finance team (2025). Q3 ledger.".to_string()],
                },
            ],
        }
    }

    /// Model payload for [`sample_outline`].
    pub fn outline_payload() -> String {
        serde_json::to_string(&sample_outline()).unwrap_or_default()
    }

    /// Model payload for [`sample_report`].
    pub fn report_payload() -> String {
        serde_json::to_string(&sample_report()).unwrap_or_default()
    }

    /// Split `payload` into `parts` fragments on char boundaries.
    pub fn split_payload(payload: &str, parts: usize) -> Vec<String> {
        let chars: Vec<char> = payload.chars().collect();
        let size = chars.len().div_ceil(parts.max(1)).max(1);
        chars.chunks(size).map(|c| c.iter().collect()).collect()
    }

    /// Mock that answers buffered calls with `payload` and streams it in
    /// `parts` fragments.
    pub fn mock_streaming(payload: &str, parts: usize) -> MockCompletionProvider {
        MockCompletionProvider::new(MockReply::Chunks(split_payload(payload, parts)))
    }
}
