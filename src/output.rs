//! Output types returned by the analysis pipeline.

use crate::pipeline::format::DocumentFormat;
use serde::{Deserialize, Serialize};

/// The structured result handed back to the caller.
///
/// All three fields are always present; lists may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short summary of the document.
    pub summary: String,
    /// Key skills and experience, in the order the model gave them.
    pub keywords: Vec<String>,
    /// Concrete improvement suggestions, in the order the model gave them.
    pub suggestions: Vec<String>,
}

/// Which recovery stage produced an [`AnalysisResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStage {
    /// The whole reply parsed as JSON.
    Direct,
    /// The substring from the first `{` to the last `}` parsed as JSON.
    BracketScan,
    /// Neither parsed; the fixed degraded result was returned.
    Fallback,
}

/// Result plus timing and size statistics for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub stats: AnalysisStats,
}

/// Statistics for one run through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub format: DocumentFormat,
    /// Characters of extracted document text.
    pub extracted_chars: usize,
    /// Characters in the user prompt sent to the model.
    pub prompt_chars: usize,
    /// Characters in the raw model reply.
    pub reply_chars: usize,
    pub parse_stage: ParseStage,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
