//! Text extraction: turn an uploaded byte blob into plain text.
//!
//! ## Why spawn_blocking?
//!
//! Both the DOCX reader (zip + XML) and pdfium are synchronous and CPU-bound.
//! [`extract`] moves the work onto Tokio's blocking pool so a large upload
//! never stalls the async worker threads; [`extract_text`] is the same logic
//! for callers that are already off the runtime.
//!
//! Every format ends in the same check: text that is empty after trimming is
//! [`AnalyzeError::EmptyContent`], so nothing downstream ever has to prompt a
//! model with a blank document.

use crate::error::AnalyzeError;
use crate::pipeline::format::DocumentFormat;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use pdfium_render::prelude::*;
use std::fmt;
use tracing::{debug, warn};

/// Normalised text content of an uploaded document.
///
/// Never blank: the only constructor rejects text that is empty once
/// whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Wrap `text`, failing with `EmptyContent` when it is blank.
    pub fn new(text: String, format: DocumentFormat) -> Result<Self, AnalyzeError> {
        if text.trim().is_empty() {
            return Err(AnalyzeError::EmptyContent { format });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Length in characters (not bytes).
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract text on the blocking thread pool.
pub async fn extract(bytes: Vec<u8>, format: DocumentFormat) -> Result<ExtractedText, AnalyzeError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, format))
        .await
        .map_err(|e| AnalyzeError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract text synchronously.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<ExtractedText, AnalyzeError> {
    let text = match format {
        DocumentFormat::Txt => decode_text(bytes),
        DocumentFormat::Docx => docx_text(bytes)?,
        DocumentFormat::Pdf => pdf_text(bytes)?,
    };
    debug!("Extracted {} bytes of text from {} upload", text.len(), format);
    ExtractedText::new(text, format)
}

// ── TXT ──────────────────────────────────────────────────────────────────────

/// UTF-8 first, then ISO-8859-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback always succeeds.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) => {
            debug!("Not valid UTF-8 ({}), decoding as Latin-1", e);
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

// ── DOCX ─────────────────────────────────────────────────────────────────────

/// Top-level body paragraphs, in document order, one per line.
///
/// Tables and other block content are not part of the paragraph stream.
fn docx_text(bytes: &[u8]) -> Result<String, AnalyzeError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| AnalyzeError::MalformedDocument {
        format: DocumentFormat::Docx,
        detail: e.to_string(),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();

    debug!("DOCX: {} paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(p: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &p.children {
        push_paragraph_child(child, &mut text);
    }
    text
}

fn push_paragraph_child(child: &ParagraphChild, text: &mut String) {
    match child {
        ParagraphChild::Run(r) => {
            for run_child in &r.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
        ParagraphChild::Hyperlink(h) => {
            for inner in &h.children {
                push_paragraph_child(inner, text);
            }
        }
        _ => {}
    }
}

// ── PDF ──────────────────────────────────────────────────────────────────────

/// Page texts in page order, skipping pages with no extractable text.
fn pdf_text(bytes: &[u8]) -> Result<String, AnalyzeError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| AnalyzeError::MalformedDocument {
            format: DocumentFormat::Pdf,
            detail: format!("{:?}", e),
        })?;

    let mut parts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        match page.text() {
            Ok(page_text) => {
                let text = page_text.all();
                if text.trim().is_empty() {
                    warn!("PDF page {} has no extractable text", idx + 1);
                } else {
                    parts.push(text);
                }
            }
            Err(e) => warn!("PDF page {}: text extraction failed: {:?}", idx + 1, e),
        }
    }

    debug!("PDF: {} pages with text", parts.len());
    Ok(parts.join("\n"))
}

/// Bind pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the
/// system library.
pub fn bind_pdfium() -> Result<Pdfium, AnalyzeError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| AnalyzeError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
