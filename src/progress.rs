//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to hear about
//! each stage as it starts and finishes. The model call dominates wall-clock
//! time, so the CLI uses these events to drive a spinner; a server could
//! forward them to a websocket instead.
//!
//! # Example
//!
//! ```rust
//! use resume_insight::{AnalysisProgressCallback, AnalyzerConfig};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl AnalysisProgressCallback for Log {
//!     fn on_completion_start(&self, prompt_chars: usize) {
//!         eprintln!("asking the model ({prompt_chars} chars)…");
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(Log))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ParseStage;
use crate::pipeline::format::DocumentFormat;
use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Concurrent analyses sharing one config call the
/// same instance from different tasks, hence `Send + Sync`.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called before the document is parsed.
    fn on_extraction_start(&self, format: DocumentFormat) {
        let _ = format;
    }

    /// Called once text has been extracted.
    fn on_extraction_complete(&self, chars: usize) {
        let _ = chars;
    }

    /// Called just before the completion request is sent.
    fn on_completion_start(&self, prompt_chars: usize) {
        let _ = prompt_chars;
    }

    /// Called when the raw reply arrives.
    fn on_completion_complete(&self, reply_chars: usize) {
        let _ = reply_chars;
    }

    /// Called after the reply has been turned into a result.
    fn on_analysis_complete(&self, stage: ParseStage) {
        let _ = stage;
    }

    /// Called once when an analysis fails, at any stage. This includes
    /// rejections that happen before extraction (no credentials, unsupported
    /// format, unreadable file).
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
