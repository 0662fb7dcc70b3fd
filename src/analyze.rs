//! Pipeline orchestration: extract → prompt → complete → parse.
//!
//! [`Analyzer`] owns the one piece of long-lived state, the completion
//! client, and runs the four stages in order for each call. Nothing is
//! shared between calls beyond that read-only client, so one `Analyzer` (or
//! one [`AnalyzerConfig`]) can serve any number of concurrent requests.
//!
//! ## Failure policy
//!
//! * No credentials → `ServiceUnavailable`, before the format is even
//!   looked at; there is no point parsing a document nobody can analyse.
//! * Extraction and completion errors are returned as-is, already
//!   classified by their stage.
//! * A reply that is not JSON is *not* an error; see
//!   [`crate::pipeline::parse`].

use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::output::{AnalysisReport, AnalysisResult, AnalysisStats};
use crate::pipeline::extract::extract;
use crate::pipeline::format::DocumentFormat;
use crate::pipeline::llm::{ChatCompletionClient, CompletionClient};
use crate::pipeline::parse::parse_reply_with_stage;
use crate::progress::ProgressCallback;
use crate::prompts::build_prompt;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const UNAVAILABLE_HINT: &str = "No API key is configured. Set DEEPSEEK_API_KEY and restart.";

/// The document-analysis pipeline.
#[derive(Clone)]
pub struct Analyzer {
    client: Option<Arc<dyn CompletionClient>>,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("client", &self.client.as_ref().map(|c| c.name().to_string()))
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Analyzer {
    /// Build the pipeline from `config`.
    ///
    /// Client resolution, most specific first:
    /// 1. `config.client`, used as-is;
    /// 2. an HTTP [`ChatCompletionClient`] when `config.api_key` is set;
    /// 3. none: the analyzer is built, but every call is `ServiceUnavailable`.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzeError> {
        let client: Option<Arc<dyn CompletionClient>> = match (&config.client, &config.api_key) {
            (Some(client), _) => Some(Arc::clone(client)),
            (None, Some(key)) => {
                let http = ChatCompletionClient::new(key.clone(), config)?;
                Some(Arc::new(http) as Arc<dyn CompletionClient>)
            }
            (None, None) => None,
        };
        Ok(Self {
            client,
            progress: config.progress_callback.clone(),
        })
    }

    /// Build a pipeline around an existing client.
    pub fn with_client(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client: Some(client),
            progress: None,
        }
    }

    /// Attach a progress observer.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Whether a completion client is configured.
    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Analyse an upload, inferring the format from `filename`.
    pub async fn analyze(&self, bytes: &[u8], filename: &str) -> Result<AnalysisResult, AnalyzeError> {
        self.analyze_detailed(bytes, filename).await.map(|r| r.result)
    }

    /// Analyse an upload whose format is already known.
    pub async fn analyze_format(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
    ) -> Result<AnalysisResult, AnalyzeError> {
        let result = match self.client() {
            Ok(client) => self.run_stages(client, bytes, format).await,
            Err(e) => Err(e),
        };
        notify_error(&self.progress, &result);
        result.map(|r| r.result)
    }

    /// Like [`Analyzer::analyze`], also returning per-stage statistics.
    pub async fn analyze_detailed(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<AnalysisReport, AnalyzeError> {
        let result = self.detailed(bytes, filename).await;
        notify_error(&self.progress, &result);
        result
    }

    async fn detailed(&self, bytes: &[u8], filename: &str) -> Result<AnalysisReport, AnalyzeError> {
        let client = self.client()?;
        let format = DocumentFormat::from_filename(filename)?;
        info!("Analysing '{}' ({}, {} bytes)", filename, format, bytes.len());
        self.run_stages(client, bytes, format).await
    }

    fn client(&self) -> Result<&Arc<dyn CompletionClient>, AnalyzeError> {
        self.client.as_ref().ok_or_else(|| AnalyzeError::ServiceUnavailable {
            hint: UNAVAILABLE_HINT.to_string(),
        })
    }

    async fn run_stages(
        &self,
        client: &Arc<dyn CompletionClient>,
        bytes: &[u8],
        format: DocumentFormat,
    ) -> Result<AnalysisReport, AnalyzeError> {
        let total_start = Instant::now();

        // ── Step 1: Extract text ─────────────────────────────────────────────
        if let Some(ref cb) = self.progress {
            cb.on_extraction_start(format);
        }
        let extract_start = Instant::now();
        let text = extract(bytes.to_vec(), format).await?;
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
        let extracted_chars = text.char_count();
        debug!("Extracted {} chars in {}ms", extracted_chars, extract_duration_ms);
        if let Some(ref cb) = self.progress {
            cb.on_extraction_complete(extracted_chars);
        }

        // ── Step 2: Build prompt ─────────────────────────────────────────────
        let prompt = build_prompt(&text);
        let prompt_chars = prompt.char_count();

        // ── Step 3: Call the model ───────────────────────────────────────────
        if let Some(ref cb) = self.progress {
            cb.on_completion_start(prompt_chars);
        }
        let llm_start = Instant::now();
        let reply = client.complete(&prompt).await?;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
        let reply_chars = reply.char_count();
        debug!(
            "{} replied with {} chars in {}ms",
            client.name(),
            reply_chars,
            llm_duration_ms
        );
        if let Some(ref cb) = self.progress {
            cb.on_completion_complete(reply_chars);
        }

        // ── Step 4: Recover structured result ────────────────────────────────
        let (result, parse_stage) = parse_reply_with_stage(reply.as_str());
        if let Some(ref cb) = self.progress {
            cb.on_analysis_complete(parse_stage);
        }

        let stats = AnalysisStats {
            format,
            extracted_chars,
            prompt_chars,
            reply_chars,
            parse_stage,
            extract_duration_ms,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Analysis complete: {} keywords, {} suggestions ({:?}), {}ms total",
            result.keywords.len(),
            result.suggestions.len(),
            parse_stage,
            stats.total_duration_ms
        );

        Ok(AnalysisReport { result, stats })
    }
}

/// Analyse an in-memory upload with a pipeline built from `config`.
///
/// Builds a fresh [`Analyzer`] (and HTTP client) per call. Long-lived
/// callers should build one `Analyzer` and reuse it so connections are
/// pooled.
///
/// # Example
/// ```rust,no_run
/// use resume_insight::{analyze, AnalyzerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnalyzerConfig::from_env()?;
/// let bytes = std::fs::read("resume.pdf")?;
/// let result = analyze(&bytes, "resume.pdf", &config).await?;
/// println!("{}", result.summary);
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    bytes: &[u8],
    filename: &str,
    config: &AnalyzerConfig,
) -> Result<AnalysisResult, AnalyzeError> {
    match Analyzer::new(config) {
        Ok(analyzer) => analyzer.analyze(bytes, filename).await,
        Err(e) => {
            let result = Err(e);
            notify_error(&config.progress_callback, &result);
            result
        }
    }
}

/// Read a file from disk and analyse it, returning the full report.
///
/// Like [`analyze`], builds a fresh [`Analyzer`] per call.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<AnalysisReport, AnalyzeError> {
    let result = read_and_analyze(path.as_ref(), config).await;
    notify_error(&config.progress_callback, &result);
    result
}

async fn read_and_analyze(path: &Path, config: &AnalyzerConfig) -> Result<AnalysisReport, AnalyzeError> {
    let analyzer = Analyzer::new(config)?;
    // Checked here too so a missing key never costs a file read.
    analyzer.client()?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    DocumentFormat::from_filename(&filename)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AnalyzeError::Internal(format!("Failed to read '{}': {}", path.display(), e)))?;

    analyzer.detailed(&bytes, &filename).await
}

fn notify_error<T>(progress: &Option<ProgressCallback>, result: &Result<T, AnalyzeError>) {
    if let (Err(e), Some(cb)) = (result, progress) {
        cb.on_error(&e.to_string());
    }
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    bytes: &[u8],
    filename: &str,
    config: &AnalyzerConfig,
) -> Result<AnalysisResult, AnalyzeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalyzeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(bytes, filename, config))
}
