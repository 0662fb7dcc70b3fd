//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! format ──▶ extract ──▶ prompts ──▶ llm ──▶ parse
//! (tag)      (text)      (prompt)    (reply)  (AnalysisResult)
//! ```
//!
//! 1. [`format`]  — decide TXT / DOCX / PDF from the declared tag before
//!    touching any bytes
//! 2. [`extract`] — decode or parse the container into non-blank text; runs
//!    in `spawn_blocking` because docx/pdfium parsing is synchronous
//! 3. [`crate::prompts`] — wrap the text in the fixed instructions
//! 4. [`llm`]     — one chat-completion call; the only stage with network I/O
//! 5. [`parse`]   — recover the three fields from the reply, degrading to a
//!    fixed fallback instead of failing

pub mod extract;
pub mod format;
pub mod llm;
pub mod parse;
