//! Prompt templates for summarization and question answering.
//!
//! Templates are plain strings with `{Context}` and `{Question}` slots.
//! The defaults mirror the standing instructions the assistant has always
//! shipped with; both can be overridden as long as the required slots are
//! present.

use anyhow::{bail, Result};

pub const DEFAULT_QUESTION_TEMPLATE: &str = "\
You are an expert code reviewer. Answer the following question \
based on the provided repository context:
Context:
{Context}
Question:
{Question}
Please provide a concise and clear answer.
";

pub const DEFAULT_SUMMARY_TEMPLATE: &str = "\
You are a technical documentation assistant. \
Summarize the provided repository contents in a clear and concise manner.
Repository Contents:
{Context}
Provide a structured summary with section headers highlighting key points, \
code structure, and any important observations.
";

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    question: String,
    summary: String,
}

impl PromptTemplates {
    /// Build templates, falling back to the defaults for any `None`.
    ///
    /// Fails if a custom question template is missing `{Context}` or
    /// `{Question}`, or a custom summary template is missing `{Context}`.
    pub fn new(question: Option<String>, summary: Option<String>) -> Result<Self> {
        let question = question.unwrap_or_else(|| DEFAULT_QUESTION_TEMPLATE.to_string());
        let summary = summary.unwrap_or_else(|| DEFAULT_SUMMARY_TEMPLATE.to_string());

        if !question.contains("{Context}") || !question.contains("{Question}") {
            bail!("Question template must contain {{Context}} and {{Question}} slots");
        }
        if !summary.contains("{Context}") {
            bail!("Summary template must contain a {{Context}} slot");
        }

        Ok(Self { question, summary })
    }

    pub fn render_question(&self, context: &str, question: &str) -> String {
        self.question
            .replace("{Question}", question)
            .replace("{Context}", context)
    }

    pub fn render_summary(&self, context: &str) -> String {
        self.summary.replace("{Context}", context)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        // the shipped defaults always carry their slots
        Self {
            question: DEFAULT_QUESTION_TEMPLATE.to_string(),
            summary: DEFAULT_SUMMARY_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_question_fills_both_slots() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_question("fn main() {}", "what does main do?");
        assert!(prompt.contains("fn main() {}"));
        assert!(prompt.contains("what does main do?"));
        assert!(!prompt.contains("{Context}"));
        assert!(!prompt.contains("{Question}"));
    }

    #[test]
    fn test_render_summary_fills_context() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_summary("README contents");
        assert!(prompt.contains("README contents"));
        assert!(!prompt.contains("{Context}"));
    }

    #[test]
    fn test_custom_templates_validated() {
        assert!(PromptTemplates::new(Some("no slots here".to_string()), None).is_err());
        assert!(PromptTemplates::new(None, Some("missing slot".to_string())).is_err());
        assert!(PromptTemplates::new(
            Some("Q: {Question} C: {Context}".to_string()),
            Some("S: {Context}".to_string())
        )
        .is_ok());
    }
}
