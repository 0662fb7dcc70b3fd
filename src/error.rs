//! Error types for the resume-insight library.
//!
//! Every failure the pipeline surfaces is an [`AnalyzeError`]. Variants are
//! grouped by who has to act on them, and [`AnalyzeError::class`] exposes
//! that grouping so a caller (CLI, web handler) can pick an exit code or
//! status without matching every variant:
//!
//! * **Client input** — the uploaded document is unusable
//!   (`UnsupportedFormat`, `MalformedDocument`, `EmptyContent`).
//! * **Upstream** — the completion service rejected or garbled the call
//!   (`AuthFailure`, `NetworkFailure`, `UpstreamFormatFailure`).
//! * **Unavailable** — no credentials were configured (`ServiceUnavailable`).
//! * **Internal** — anything else, with the causing detail attached.
//!
//! A model reply that is not valid JSON is *not* an error: the
//! structured-result stage degrades to a fallback [`crate::AnalysisResult`].

use crate::pipeline::format::DocumentFormat;
use thiserror::Error;

/// All fatal errors returned by the resume-insight library.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// File extension / format tag is not one of `txt`, `docx`, `pdf`.
    #[error("Unsupported file type '{tag}'\nUpload a .txt, .docx or .pdf file.")]
    UnsupportedFormat { tag: String },

    /// The container could not be decoded or parsed.
    #[error("Could not parse {format} document: {detail}")]
    MalformedDocument {
        format: DocumentFormat,
        detail: String,
    },

    /// The document parsed but holds no text once whitespace is trimmed.
    #[error("No text could be extracted from the {format} document")]
    EmptyContent { format: DocumentFormat },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The completion service rejected the credentials (HTTP 401/403).
    #[error("Authentication rejected by '{provider}' (HTTP {status}): {detail}")]
    AuthFailure {
        provider: String,
        status: u16,
        detail: String,
    },

    /// Connection-level failure, including the request timeout.
    #[error("Network error talking to '{provider}': {detail}")]
    NetworkFailure { provider: String, detail: String },

    /// Non-2xx status, or a body without a single completion choice.
    #[error("Unexpected response from '{provider}'{}: {detail}", status_suffix(.status))]
    UpstreamFormatFailure {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key configured; analysis is disabled for the process.
    #[error("Analysis service is unavailable.\n{hint}")]
    ServiceUnavailable { hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library for PDF text extraction.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF extraction needs the pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Coarse classification of an [`AnalyzeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The uploaded document is at fault.
    ClientInput,
    /// The completion service failed or misbehaved.
    Upstream,
    /// Analysis is disabled by local configuration.
    Unavailable,
    /// Anything else.
    Internal,
}

impl ErrorClass {
    /// HTTP status a web front-end would surface for this class.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorClass::ClientInput => 400,
            ErrorClass::Upstream => 502,
            ErrorClass::Unavailable => 503,
            ErrorClass::Internal => 500,
        }
    }
}

impl AnalyzeError {
    /// Classify this error for the caller.
    pub fn class(&self) -> ErrorClass {
        match self {
            AnalyzeError::UnsupportedFormat { .. }
            | AnalyzeError::MalformedDocument { .. }
            | AnalyzeError::EmptyContent { .. } => ErrorClass::ClientInput,
            AnalyzeError::AuthFailure { .. }
            | AnalyzeError::NetworkFailure { .. }
            | AnalyzeError::UpstreamFormatFailure { .. } => ErrorClass::Upstream,
            AnalyzeError::ServiceUnavailable { .. } => ErrorClass::Unavailable,
            AnalyzeError::InvalidConfig(_)
            | AnalyzeError::PdfiumBindingFailed(_)
            | AnalyzeError::Internal(_) => ErrorClass::Internal,
        }
    }
}
