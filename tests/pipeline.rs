//! Pipeline integration tests.
//!
//! The completion service is replaced by a scripted [`CompletionClient`], so
//! these run offline and exercise ordering and error policy of the whole
//! extract → prompt → complete → parse sequence.

use async_trait::async_trait;
use docx_rs::{Docx, Paragraph, Run};
use pdfium_render::prelude::*;
use resume_insight::pipeline::extract::bind_pdfium;
use resume_insight::pipeline::parse::{SUGGESTION_MALFORMED, SUMMARY_UNPARSEABLE};
use resume_insight::prompts::{DOCUMENT_END, DOCUMENT_START};
use resume_insight::{
    analyze, analyze_file, AnalysisProgressCallback, AnalysisResult, AnalyzeError, Analyzer,
    AnalyzerConfig, CompletionClient, DocumentFormat, ErrorClass, ParseStage, Prompt,
    RawCompletion,
};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

enum Script {
    Reply(String),
    Fail(fn() -> AnalyzeError),
}

/// Completion client that returns a scripted outcome and records prompts.
struct FakeClient {
    script: Script,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeClient {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Reply(reply.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(make: fn() -> AnalyzeError) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Fail(make),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for FakeClient {
    async fn complete(&self, prompt: &Prompt) -> Result<RawCompletion, AnalyzeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        match &self.script {
            Script::Reply(r) => Ok(RawCompletion::new(r.clone())),
            Script::Fail(make) => Err(make()),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

const GOOD_REPLY: &str = r#"{"summary":"S","keywords":["a","b"],"suggestions":["x"]}"#;
const RESUME: &str = "Jane Doe\nSenior Rust Engineer\nSkills: Tokio, Axum, PostgreSQL\n";

fn analyzer_for(client: &Arc<FakeClient>) -> Analyzer {
    Analyzer::with_client(Arc::clone(client) as Arc<dyn CompletionClient>)
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let mut docx = Docx::new();
    for p in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)));
    }
    let mut buf = Cursor::new(Vec::new());
    docx.build().pack(&mut buf).unwrap();
    buf.into_inner()
}

/// A PDF of `pages` blank pages, or `None` when no pdfium library can be bound.
fn blank_pdf_bytes(pages: usize) -> Option<Vec<u8>> {
    let Ok(pdfium) = bind_pdfium() else {
        println!("SKIP — no pdfium library available");
        return None;
    };
    let mut document = pdfium.create_new_pdf().unwrap();
    for _ in 0..pages {
        document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .unwrap();
    }
    Some(document.save_to_bytes().unwrap())
}

fn expected(summary: &str, keywords: &[&str], suggestions: &[&str]) -> AnalysisResult {
    AnalysisResult {
        summary: summary.into(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
    }
}

// ── Happy paths ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn direct_json_reply_becomes_result() {
    let client = FakeClient::replying(GOOD_REPLY);
    let report = analyzer_for(&client)
        .analyze_detailed(RESUME.as_bytes(), "cv.txt")
        .await
        .unwrap();

    assert_eq!(report.result, expected("S", &["a", "b"], &["x"]));
    assert_eq!(report.stats.parse_stage, ParseStage::Direct);
    assert_eq!(report.stats.format, DocumentFormat::Txt);
    assert_eq!(report.stats.extracted_chars, RESUME.chars().count());
    assert_eq!(report.stats.reply_chars, GOOD_REPLY.len());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn prose_wrapped_reply_is_recovered() {
    let client = FakeClient::replying(
        r#"Here is the result: {"summary":"S","keywords":[],"suggestions":["x"]} Thanks!"#,
    );
    let report = analyzer_for(&client)
        .analyze_detailed(RESUME.as_bytes(), "cv.txt")
        .await
        .unwrap();
    assert_eq!(report.result, expected("S", &[], &["x"]));
    assert_eq!(report.stats.parse_stage, ParseStage::BracketScan);
}

#[tokio::test]
async fn unparseable_reply_degrades_instead_of_failing() {
    let client = FakeClient::replying("I'm sorry, I can't produce JSON today.");
    let result = analyzer_for(&client)
        .analyze(RESUME.as_bytes(), "cv.txt")
        .await
        .unwrap();
    assert_eq!(
        result,
        expected(SUMMARY_UNPARSEABLE, &[], &[SUGGESTION_MALFORMED])
    );
}

#[tokio::test]
async fn missing_fields_default_to_empty_lists() {
    let client = FakeClient::replying(r#"{"summary":"S"}"#);
    let result = analyzer_for(&client)
        .analyze(RESUME.as_bytes(), "cv.txt")
        .await
        .unwrap();
    assert_eq!(result, expected("S", &[], &[]));
}

#[tokio::test]
async fn document_text_is_fenced_in_prompt() {
    let client = FakeClient::replying(GOOD_REPLY);
    analyzer_for(&client)
        .analyze(RESUME.as_bytes(), "CV.TXT")
        .await
        .unwrap();

    let prompt = client.last_prompt();
    let start = prompt.find(DOCUMENT_START).unwrap();
    let end = prompt.rfind(DOCUMENT_END).unwrap();
    let doc = prompt.find(RESUME).unwrap();
    assert!(start < doc && doc < end);
}

#[tokio::test]
async fn docx_upload_is_extracted_and_analysed() {
    let client = FakeClient::replying(GOOD_REPLY);
    let bytes = docx_bytes(&["Jane Doe", "Rust Engineer"]);
    let result = analyzer_for(&client)
        .analyze_format(&bytes, DocumentFormat::Docx)
        .await
        .unwrap();

    assert_eq!(result.summary, "S");
    let prompt = client.last_prompt();
    assert!(prompt.contains("Jane Doe"));
    assert!(prompt.contains("Rust Engineer"));
}

// ── Error policy ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_extension_is_rejected_before_any_work() {
    let client = FakeClient::replying(GOOD_REPLY);
    let err = analyzer_for(&client)
        .analyze(b"PK\x03\x04 spreadsheet", "budget.xlsx")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::UnsupportedFormat { .. }), "{err:?}");
    assert_eq!(err.class(), ErrorClass::ClientInput);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn whitespace_document_never_reaches_the_model() {
    let client = FakeClient::replying(GOOD_REPLY);
    let analyzer = analyzer_for(&client);

    let txt = analyzer.analyze(b" \n\t\n ", "cv.txt").await.unwrap_err();
    assert!(matches!(txt, AnalyzeError::EmptyContent { .. }), "{txt:?}");

    let docx = analyzer
        .analyze(&docx_bytes(&["  ", ""]), "cv.docx")
        .await
        .unwrap_err();
    assert!(matches!(docx, AnalyzeError::EmptyContent { .. }), "{docx:?}");

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn blank_pdf_never_reaches_the_model() {
    let Some(bytes) = blank_pdf_bytes(2) else {
        return;
    };
    let client = FakeClient::replying(GOOD_REPLY);
    let err = analyzer_for(&client)
        .analyze(&bytes, "scan.pdf")
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            AnalyzeError::EmptyContent {
                format: DocumentFormat::Pdf
            }
        ),
        "{err:?}"
    );
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn corrupt_docx_is_malformed() {
    let client = FakeClient::replying(GOOD_REPLY);
    let err = analyzer_for(&client)
        .analyze(b"definitely not a zip", "cv.docx")
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            AnalyzeError::MalformedDocument {
                format: DocumentFormat::Docx,
                ..
            }
        ),
        "{err:?}"
    );
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn no_credentials_is_always_service_unavailable() {
    let config = AnalyzerConfig::builder().api_key("").build().unwrap();
    for (bytes, name) in [
        (RESUME.as_bytes().to_vec(), "cv.txt"),
        (b"garbage".to_vec(), "cv.docx"),
        (b"garbage".to_vec(), "cv.xlsx"),
        (Vec::new(), "cv.pdf"),
    ] {
        let err = analyze(&bytes, name, &config).await.unwrap_err();
        assert!(
            matches!(err, AnalyzeError::ServiceUnavailable { .. }),
            "{name}: {err:?}"
        );
        assert_eq!(err.class().http_status(), 503);
    }
}

#[tokio::test]
async fn upstream_failures_propagate_unchanged() {
    let client = FakeClient::failing(|| AnalyzeError::NetworkFailure {
        provider: "fake".into(),
        detail: "request timed out after 30s".into(),
    });
    let err = analyzer_for(&client)
        .analyze(RESUME.as_bytes(), "cv.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::NetworkFailure { .. }), "{err:?}");
    assert_eq!(err.class(), ErrorClass::Upstream);

    let client = FakeClient::failing(|| AnalyzeError::AuthFailure {
        provider: "fake".into(),
        status: 401,
        detail: "bad key".into(),
    });
    let err = analyzer_for(&client)
        .analyze(RESUME.as_bytes(), "cv.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::AuthFailure { status: 401, .. }));
}

// ── Config, progress, files, concurrency ─────────────────────────────────────

#[derive(Default)]
struct StageLog(Mutex<Vec<&'static str>>);

impl AnalysisProgressCallback for StageLog {
    fn on_extraction_start(&self, _format: DocumentFormat) {
        self.0.lock().unwrap().push("extract");
    }
    fn on_extraction_complete(&self, _chars: usize) {
        self.0.lock().unwrap().push("extracted");
    }
    fn on_completion_start(&self, _prompt_chars: usize) {
        self.0.lock().unwrap().push("complete");
    }
    fn on_completion_complete(&self, _reply_chars: usize) {
        self.0.lock().unwrap().push("completed");
    }
    fn on_analysis_complete(&self, _stage: ParseStage) {
        self.0.lock().unwrap().push("done");
    }
    fn on_error(&self, _error: &str) {
        self.0.lock().unwrap().push("error");
    }
}

#[tokio::test]
async fn config_client_and_progress_are_used() {
    let client = FakeClient::replying(GOOD_REPLY);
    let log = Arc::new(StageLog::default());
    let config = AnalyzerConfig::builder()
        .client(Arc::clone(&client) as Arc<dyn CompletionClient>)
        .progress_callback(Arc::clone(&log) as Arc<dyn AnalysisProgressCallback>)
        .build()
        .unwrap();

    analyze(RESUME.as_bytes(), "cv.txt", &config).await.unwrap();
    assert_eq!(
        *log.0.lock().unwrap(),
        vec!["extract", "extracted", "complete", "completed", "done"]
    );

    log.0.lock().unwrap().clear();
    analyze(b"   ", "cv.txt", &config).await.unwrap_err();
    assert_eq!(*log.0.lock().unwrap(), vec!["extract", "error"]);
}

#[tokio::test]
async fn rejections_before_extraction_still_report_errors() {
    let client = FakeClient::replying(GOOD_REPLY);
    let log = Arc::new(StageLog::default());
    let configured = AnalyzerConfig::builder()
        .client(Arc::clone(&client) as Arc<dyn CompletionClient>)
        .progress_callback(Arc::clone(&log) as Arc<dyn AnalysisProgressCallback>)
        .build()
        .unwrap();

    analyze(b"cells", "budget.xlsx", &configured).await.unwrap_err();
    assert_eq!(*log.0.lock().unwrap(), vec!["error"]);

    log.0.lock().unwrap().clear();
    let dir = tempfile::tempdir().unwrap();
    analyze_file(dir.path().join("missing.txt"), &configured)
        .await
        .unwrap_err();
    assert_eq!(*log.0.lock().unwrap(), vec!["error"]);

    log.0.lock().unwrap().clear();
    let keyless = AnalyzerConfig::builder()
        .progress_callback(Arc::clone(&log) as Arc<dyn AnalysisProgressCallback>)
        .build()
        .unwrap();
    analyze(RESUME.as_bytes(), "cv.txt", &keyless).await.unwrap_err();
    analyze_file(dir.path().join("cv.txt"), &keyless).await.unwrap_err();
    assert_eq!(*log.0.lock().unwrap(), vec!["error", "error"]);

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn analyze_file_reads_from_disk() {
    let client = FakeClient::replying(GOOD_REPLY);
    let config = AnalyzerConfig::builder()
        .client(Arc::clone(&client) as Arc<dyn CompletionClient>)
        .build()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resume.txt");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(RESUME.as_bytes())
        .unwrap();

    let report = analyze_file(&path, &config).await.unwrap();
    assert_eq!(report.result.keywords, vec!["a", "b"]);

    let err = analyze_file(dir.path().join("resume.odt"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::UnsupportedFormat { .. }));

    let err = analyze_file(dir.path().join("missing.txt"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::Internal(_)), "{err:?}");
}

#[tokio::test]
async fn concurrent_analyses_are_independent() {
    let client = FakeClient::replying(GOOD_REPLY);
    let analyzer = analyzer_for(&client);

    let (a, b, c) = tokio::join!(
        analyzer.analyze(b"first resume", "a.txt"),
        analyzer.analyze(b"   ", "b.txt"),
        analyzer.analyze(b"third resume", "c.txt"),
    );
    assert!(a.is_ok());
    assert!(matches!(b, Err(AnalyzeError::EmptyContent { .. })));
    assert!(c.is_ok());
    assert_eq!(client.calls(), 2);
}
