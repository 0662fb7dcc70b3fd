//! Structured-result extraction: recover `{summary, keywords, suggestions}`
//! from a model reply that is only *asked* to be JSON.
//!
//! ## Why this stage never fails
//!
//! By the time a reply reaches this module a paid model call has already
//! succeeded. A formatting slip (prose around the JSON, a code fence, a
//! missing field) should cost the caller a field, not the whole answer, so
//! every path here ends in a well-formed [`AnalysisResult`].
//!
//! ## Stage Order
//!
//! 1. **Direct** — the whole reply parses as JSON.
//! 2. **Bracket scan** — the slice from the first `{` to the last `}`
//!    (inclusive) parses as JSON. Catches "Here is the result: {…} Thanks!"
//!    and ```` ```json ```` fences.
//! 3. **Fallback** — a fixed degraded result.
//!
//! Whichever of 1 or 2 succeeds, the parsed value goes through field-level
//! normalisation: a non-object counts as `{}`, a missing or non-string
//! `summary` becomes [`SUMMARY_MISSING`], and a missing or non-string-list
//! `keywords` / `suggestions` becomes empty.

use crate::output::{AnalysisResult, ParseStage};
use serde_json::Value;
use tracing::{debug, warn};

/// Summary used by the degraded fallback result.
pub const SUMMARY_UNPARSEABLE: &str = "Could not parse a valid summary from the model reply.";

/// Summary used when a parsed reply has no usable `summary` field.
pub const SUMMARY_MISSING: &str = "No summary was generated.";

/// Sole suggestion of the degraded fallback result.
pub const SUGGESTION_MALFORMED: &str =
    "The model reply was malformed, so no suggestions could be extracted.";

/// Turn a raw model reply into an [`AnalysisResult`].
pub fn parse_reply(raw: &str) -> AnalysisResult {
    parse_reply_with_stage(raw).0
}

/// Like [`parse_reply`], also reporting which stage produced the result.
pub fn parse_reply_with_stage(raw: &str) -> (AnalysisResult, ParseStage) {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        debug!("Model reply parsed directly");
        return (normalise(value), ParseStage::Direct);
    }

    if let Some(value) = bracket_scan(raw) {
        debug!("Model reply parsed after bracket scan");
        return (normalise(value), ParseStage::BracketScan);
    }

    warn!(
        "Model reply ({} chars) is not JSON; returning fallback result",
        raw.len()
    );
    (fallback_result(), ParseStage::Fallback)
}

/// The fixed result returned when no JSON could be recovered.
pub fn fallback_result() -> AnalysisResult {
    AnalysisResult {
        summary: SUMMARY_UNPARSEABLE.to_string(),
        keywords: Vec::new(),
        suggestions: vec![SUGGESTION_MALFORMED.to_string()],
    }
}

/// Parse the first-`{`-to-last-`}` slice, if the braces are in order.
fn bracket_scan(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start >= end {
        return None;
    }
    // Both indices sit on one-byte ASCII braces, so the slice is on char
    // boundaries.
    serde_json::from_str(&raw[start..=end]).ok()
}

fn normalise(value: Value) -> AnalysisResult {
    let Value::Object(map) = value else {
        debug!("Parsed reply is not a JSON object; treating as empty");
        return AnalysisResult {
            summary: SUMMARY_MISSING.to_string(),
            keywords: Vec::new(),
            suggestions: Vec::new(),
        };
    };

    let summary = match map.get("summary") {
        Some(Value::String(s)) => s.clone(),
        _ => SUMMARY_MISSING.to_string(),
    };

    AnalysisResult {
        summary,
        keywords: string_list(map.get("keywords")),
        suggestions: string_list(map.get("suggestions")),
    }
}

/// A JSON array whose every element is a string, else empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}
