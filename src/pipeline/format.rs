//! Document format detection.
//!
//! The format is decided from the declared tag (usually the upload's file
//! extension) before a single byte of the document is parsed, so an
//! unsupported upload costs nothing.

use crate::error::AnalyzeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The document containers the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Plain text, UTF-8 with a Latin-1 fallback.
    Txt,
    /// Office Open XML word-processing document.
    Docx,
    /// Portable Document Format.
    Pdf,
}

impl DocumentFormat {
    /// Resolve a format tag such as `"pdf"`, `".DOCX"` or `"Txt"`.
    pub fn from_tag(tag: &str) -> Result<Self, AnalyzeError> {
        let normalised = tag.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalised.as_str() {
            "txt" => Ok(DocumentFormat::Txt),
            "docx" => Ok(DocumentFormat::Docx),
            "pdf" => Ok(DocumentFormat::Pdf),
            _ => Err(AnalyzeError::UnsupportedFormat {
                tag: tag.to_string(),
            }),
        }
    }

    /// Infer the format from a filename's extension (text after the last `.`).
    ///
    /// A name without an extension is rejected the same way as an unknown one.
    pub fn from_filename(filename: &str) -> Result<Self, AnalyzeError> {
        match filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => Self::from_tag(ext),
            _ => Err(AnalyzeError::UnsupportedFormat {
                tag: filename.to_string(),
            }),
        }
    }

    /// Canonical lowercase extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Txt => "txt",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentFormat::Txt => "TXT",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Pdf => "PDF",
        })
    }
}

impl FromStr for DocumentFormat {
    type Err = AnalyzeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}
