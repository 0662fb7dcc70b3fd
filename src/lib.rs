//! # resume-insight
//!
//! Analyse a resume (plain text, DOCX or PDF) with a chat-completion LLM and
//! get back a strict three-field result: a short summary, a keyword list and
//! a list of improvement suggestions.
//!
//! ## Why this crate?
//!
//! Asking a model for JSON is easy; *getting* JSON back is not. Replies come
//! wrapped in prose, fenced in code blocks, or missing a field. This crate
//! keeps the hard failures (bad upload, rejected key, dead network) as typed
//! errors, and absorbs the soft ones (a sloppy reply) into a well-formed
//! result, so callers always get either an error they can report or all
//! three fields.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (bytes + filename)
//!  │
//!  ├─ 1. Format   .txt / .docx / .pdf, rejected before parsing otherwise
//!  ├─ 2. Extract  UTF-8 → Latin-1 / docx paragraphs / pdfium page text
//!  ├─ 3. Prompt   schema instructions + fenced document text
//!  ├─ 4. Complete one bearer-authenticated chat-completion request
//!  └─ 5. Parse    direct JSON → bracket scan → fixed fallback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_insight::{analyze, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads DEEPSEEK_API_KEY (and optional DEEPSEEK_BASE_URL / DEEPSEEK_MODEL)
//!     let config = AnalyzerConfig::from_env()?;
//!     let bytes = std::fs::read("resume.docx")?;
//!     let result = analyze(&bytes, "resume.docx", &config).await?;
//!     println!("{}", result.summary);
//!     println!("keywords: {}", result.keywords.join(", "));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-insight` binary (clap + anyhow + tracing-subscriber) |
//!
//! PDF extraction needs the pdfium shared library at runtime; see
//! [`AnalyzeError::PdfiumBindingFailed`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_file, analyze_sync, Analyzer};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, ApiKey};
pub use error::{AnalyzeError, ErrorClass};
pub use output::{AnalysisReport, AnalysisResult, AnalysisStats, ParseStage};
pub use pipeline::extract::{extract_text, ExtractedText};
pub use pipeline::format::DocumentFormat;
pub use pipeline::llm::{ChatCompletionClient, CompletionClient, RawCompletion};
pub use pipeline::parse::{parse_reply, parse_reply_with_stage};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{build_prompt, Prompt};
