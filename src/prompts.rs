//! Prompts for LLM-based resume analysis.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the output schema the model is asked for
//!    and the schema [`crate::pipeline::parse`] reads back live side by side.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live model, so prompt regressions are easy to catch.
//!
//! The document is fenced between [`DOCUMENT_START`] and [`DOCUMENT_END`] so
//! instructions embedded in a resume ("ignore the above…") read as content,
//! not as part of the task.

use crate::pipeline::extract::ExtractedText;
use std::fmt;

/// Default persona sent as the system message.
///
/// Used when `AnalyzerConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert resume-analysis assistant. You \
extract the key information from a resume and give concrete, actionable suggestions to \
improve it.";

/// Marker opening the document block.
pub const DOCUMENT_START: &str = "--- START ---";

/// Marker closing the document block.
pub const DOCUMENT_END: &str = "--- END ---";

/// Required output schema, with type hints and length guidance.
pub const FORMAT_INSTRUCTIONS: &str = r#"Return the result as valid JSON containing exactly these three fields:
{
    "summary": "<string: a short summary of the resume, at most about 150 characters>",
    "keywords": ["<string>", "..."],
    "suggestions": ["<string>", "..."]
}
- "summary": string, at most about 150 characters.
- "keywords": list of 5-10 short strings, the most important skills and experience.
- "suggestions": list of 3-5 short strings, specific improvements to language, structure or content.
Make sure the reply is valid JSON. Do not add any text before or after the JSON object."#;

/// The full user prompt for one analysis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the user prompt: task, schema instructions, then the fenced document.
pub fn build_prompt(text: &ExtractedText) -> Prompt {
    Prompt(format!(
        "Analyse the following resume and give detailed feedback.\n\n\
         {FORMAT_INSTRUCTIONS}\n\n\
         Resume content:\n\
         {DOCUMENT_START}\n\
         {}\n\
         {DOCUMENT_END}\n",
        text.as_str()
    ))
}
