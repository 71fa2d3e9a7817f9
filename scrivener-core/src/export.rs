//! Plain-text rendering of a finished report.

use std::fmt::Write as _;

use crate::entities::{ReportItem, ReportResult};

impl ReportResult {
    /// Render as numbered plain text.
    ///
    /// Headings are numbered `1.`, subsections `1.1`. Every line of text is
    /// followed by a blank line, and each top-level item ends with one more.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}\n\n", self.title);

        for (i, item) in self.report.iter().enumerate() {
            let n = i + 1;
            let _ = write!(out, "{}. {}\n\n", n, item.heading());
            match item {
                ReportItem::Nested { sections, .. } => {
                    for (j, section) in sections.iter().enumerate() {
                        let _ = write!(out, "{}.{} {}\n\n", n, j + 1, section.subheading);
                        for paragraph in &section.content {
                            let _ = write!(out, "{}\n\n", paragraph);
                        }
                    }
                }
                ReportItem::Flat { content, .. } => {
                    for paragraph in content {
                        let _ = write!(out, "{}\n\n", paragraph);
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Download file name for a report title.
///
/// Anything that is not a letter or digit becomes `_`.
pub fn export_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.txt", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ReportSection;

    fn sample() -> ReportResult {
        ReportResult {
            title: "Annual Review".to_string(),
            report: vec![
                ReportItem::Flat {
                    heading: "Summary".to_string(),
                    content: vec!["First.".to_string(), "Second.".to_string()],
                },
                ReportItem::Nested {
                    heading: "Findings".to_string(),
                    sections: vec![
                        ReportSection {
                            subheading: "Revenue".to_string(),
                            content: vec!["Up 7%.".to_string()],
                        },
                        ReportSection {
                            subheading: "Costs".to_string(),
                            content: vec!["Flat.".to_string()],
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_plain_text_layout() {
        let expected = "Annual Review\n\n\
                        1. Summary\n\nFirst.\n\nSecond.\n\n\n\
                        2. Findings\n\n2.1 Revenue\n\nUp 7%.\n\n2.2 Costs\n\nFlat.\n\n\n";
        assert_eq!(sample().to_plain_text(), expected);
    }

    #[test]
    fn test_plain_text_empty_report() {
        let report = ReportResult {
            title: "Nothing".to_string(),
            report: vec![],
        };
        assert_eq!(report.to_plain_text(), "Nothing\n\n");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Q3 Review: 2025/26"), "Q3_Review__2025_26.txt");
        assert_eq!(export_file_name("연간 보고서"), "연간_보고서.txt");
        assert_eq!(export_file_name(""), ".txt");
    }
}
