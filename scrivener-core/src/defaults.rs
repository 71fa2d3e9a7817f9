//! Built-in prompt templates and system instructions.

use chrono::{DateTime, Utc};

use crate::entities::PromptTemplate;
use crate::enums::PromptType;

pub const OUTLINE_DEFAULT_ID: &str = "outline-default";
pub const REPORT_DEFAULT_ID: &str = "report-default";

/// System message sent with every outline request.
pub const OUTLINE_SYSTEM_INSTRUCTION: &str = "You are an assistant that designs report outlines. \
Always answer with a single JSON object containing \"title\" and \"structure\".";

/// System message sent with every report request.
pub const REPORT_SYSTEM_INSTRUCTION: &str = "You are an assistant that writes professional reports. \
Always answer with a single JSON object containing \"title\" and \"report\".";

pub const OUTLINE_TEMPLATE: &str = r#"### Instructions
You generate report outlines only.
Using the four inputs below (purpose, topic, audience, content), write a table of contents made of a title, headings and subheadings.

### Inputs
- purpose: why the report is being written
- topic: the core subject of the report
- audience: the primary readers (for example executives or clients)
- content: the ideas, data, cases and arguments the report must cover, in any form

### Rules
1. title: a phrase that lets the audience grasp the purpose and topic at a glance.
2. structure array:
   - propose 3 to 7 headings (first level).
   - give each heading an array of 0 to 4 subheadings (second level).
   - design headings and subheadings around the keywords, arguments and data in the content.

### Output format
{
  "title": "...",
  "structure": [
    { "heading": "...", "subheadings": ["...", "..."] },
    { "heading": "..." },
    { "heading": "...", "subheadings": ["..."] }
  ]
}

### Provided information
Purpose: {{purpose}}
Topic: {{topic}}
Audience: {{audience}}
Content: {{content}}"#;

pub const REPORT_TEMPLATE: &str = r#"### Instructions
You write professional reports. Combine the title, structure, content, tone and audience below into a report that is readable, credible and supports decisions.

### Inputs
- title: the report title (keep as given)
- structure: the heading and subheading arrays (keep as given)
- content: details, data, arguments and examples for each heading or subheading
- tone: formal, professional, analytical and so on

### Rules
1. Executive Summary
- Insert an "Executive Summary" section at the very top, no longer than one page (300 words).
- Cover the report purpose, key figures, main conclusions and four recommended actions.
2. Keep and split the structure
- Follow the heading order in structure exactly.
- When a heading has subheadings, group them in a sections array; otherwise put content directly under the heading.
- When findings and recommendations share a heading, write them as two paragraphs, findings first.
3. Paragraphs
- Write at least two paragraphs per content entry, each 250 to 500 characters.
- Open with 2 to 3 claims, support them with 1 to 2 pieces of evidence, close with a summary or outlook.
4. Figures
- Where no figure was provided, write "△△ %(TBD)" to mark the gap.
- Prefer exact values, ratios and periods over vague words such as "higher" or "lower".
- State the comparison basis in parentheses when useful, e.g. "(+7% year over year)".
5. Tone
- No colloquialisms or vague wording; keep the writing factual and objective.
6. Citations
- Cite external sources inline as "(OECD, 2023)".
- End the report with a "References" heading listing sources in APA 7th edition style.

### Output format
{
  "title": "...",
  "report": [
    {
      "heading": "...",
      "sections": [
        { "subheading": "...", "content": ["...", "..."] }
      ]
    },
    {
      "heading": "...",
      "content": ["...", "..."]
    },
    {
      "heading": "References",
      "content": ["..."]
    }
  ]
}

### Provided information
Outline: {{titleStructure}}
Audience: {{audience}}
Content: {{content}}
Tone: {{tone}}"#;

/// Default template content for a prompt type.
pub fn default_content(prompt_type: PromptType) -> &'static str {
    match prompt_type {
        PromptType::Outline => OUTLINE_TEMPLATE,
        PromptType::Report => REPORT_TEMPLATE,
    }
}

/// The two built-in templates, stamped with `now`.
pub fn default_prompts(now: DateTime<Utc>) -> Vec<PromptTemplate> {
    vec![
        PromptTemplate {
            id: OUTLINE_DEFAULT_ID.to_string(),
            name: "Default outline prompt".to_string(),
            description: "Generates the report title and heading structure".to_string(),
            content: OUTLINE_TEMPLATE.to_string(),
            prompt_type: PromptType::Outline,
            created_at: now,
            updated_at: now,
        },
        PromptTemplate {
            id: REPORT_DEFAULT_ID.to_string(),
            name: "Default report prompt".to_string(),
            description: "Writes the full report from an approved outline".to_string(),
            content: REPORT_TEMPLATE.to_string(),
            prompt_type: PromptType::Report,
            created_at: now,
            updated_at: now,
        },
    ]
}
