//! CLI binary for resume-insight.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AnalyzerConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume_insight::{
    analyze_file, AnalysisProgressCallback, AnalysisReport, AnalyzeError, AnalyzerConfig,
    DocumentFormat, ErrorClass, ParseStage,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the current pipeline stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Analysing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, format: DocumentFormat) {
        self.bar.set_message(format!("extracting {format} text…"));
    }

    fn on_extraction_complete(&self, chars: usize) {
        self.bar.println(format!("  {} extracted {} chars", green("✓"), chars));
    }

    fn on_completion_start(&self, prompt_chars: usize) {
        let sent = dim(&format!("({prompt_chars} chars sent)"));
        self.bar.set_message(format!("waiting for the model {sent}"));
    }

    fn on_completion_complete(&self, reply_chars: usize) {
        self.bar
            .println(format!("  {} model replied ({} chars)", green("✓"), reply_chars));
    }

    fn on_analysis_complete(&self, stage: ParseStage) {
        let note = match stage {
            ParseStage::Direct => green("✔ done"),
            ParseStage::BracketScan => cyan("✔ done (JSON recovered from surrounding text)"),
            ParseStage::Fallback => cyan("⚠ done (reply was not JSON; fallback result)"),
        };
        self.bar.finish_and_clear();
        eprintln!("{note}");
    }

    fn on_error(&self, _error: &str) {
        // main() prints the full error chain.
        self.bar.finish_and_clear();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"ENVIRONMENT:
  DEEPSEEK_API_KEY     API key for the completion service (required)
  DEEPSEEK_BASE_URL    Override the API base URL (any OpenAI-compatible endpoint)
  DEEPSEEK_MODEL       Override the model ID
  PDFIUM_LIB_PATH      Path to libpdfium, needed for .pdf input
  RUST_LOG             Log filter, e.g. resume_insight=debug

A .env file in the working directory is loaded at startup.

EXIT CODES:
  0  success
  1  internal error
  2  unusable document (unsupported type, corrupt, or no text)
  3  completion service error (auth, network, bad response)
  4  analysis unavailable (no API key)
"#;

/// Analyse a resume with an LLM: summary, keywords and suggestions.
#[derive(Parser, Debug)]
#[command(
    name = "resume-insight",
    version,
    about = "Analyse a resume (.txt, .docx, .pdf) with an LLM",
    long_about = "Extract the text of a resume, ask a chat-completion model to analyse it, \
and print a short summary, the key skills, and concrete suggestions for improvement. \
Works with DeepSeek and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Resume file: .txt, .docx or .pdf.
    input: PathBuf,

    /// API key (prefer the environment variable).
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL; requests go to {base_url}/chat/completions.
    #[arg(long, env = "DEEPSEEK_BASE_URL", default_value = resume_insight::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Model ID.
    #[arg(long, env = "DEEPSEEK_MODEL", default_value = resume_insight::config::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "RESUME_INSIGHT_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max tokens the model may generate.
    #[arg(long, env = "RESUME_INSIGHT_MAX_TOKENS", default_value_t = 800)]
    max_tokens: u32,

    /// Request timeout in seconds.
    #[arg(long, env = "RESUME_INSIGHT_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "RESUME_INSIGHT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output the result as JSON.
    #[arg(long, env = "RESUME_INSIGHT_JSON")]
    json: bool,

    /// Include timing and size statistics.
    #[arg(long)]
    stats: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "RESUME_INSIGHT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESUME_INSIGHT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long, env = "RESUME_INSIGHT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Must run before clap reads `env = ...` fallbacks.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("✘ error:"), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let config = build_config(cli, show_progress).await?;

    let report = analyze_file(&cli.input, &config)
        .await
        .with_context(|| format!("Analysis of {} failed", cli.input.display()))?;

    if cli.json {
        let json = if cli.stats {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string_pretty(&report.result)
        }
        .context("Failed to serialise result")?;
        println!("{json}");
    } else {
        print_report(&report, cli.stats && !cli.quiet);
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
async fn build_config(cli: &Cli, show_progress: bool) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .base_url(&cli.base_url)
        .model(&cli.model)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .timeout_secs(cli.timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    let mut config = builder.build().context("Invalid configuration")?;
    // Only start the spinner once the config is known to be valid.
    if show_progress {
        config.progress_callback = Some(CliProgressCallback::new());
    }
    Ok(config)
}

fn print_report(report: &AnalysisReport, with_stats: bool) {
    let r = &report.result;

    println!("{}", bold("Summary"));
    println!("  {}", r.summary);
    println!();

    println!("{}", bold("Keywords"));
    if r.keywords.is_empty() {
        println!("  {}", dim("(none)"));
    } else {
        println!("  {}", r.keywords.join(", "));
    }
    println!();

    println!("{}", bold("Suggestions"));
    if r.suggestions.is_empty() {
        println!("  {}", dim("(none)"));
    }
    for (i, s) in r.suggestions.iter().enumerate() {
        println!("  {}. {}", i + 1, s);
    }

    if with_stats {
        let s = &report.stats;
        eprintln!();
        eprintln!(
            "{}",
            dim(&format!(
                "{} · {} chars extracted in {}ms · model {}ms · parse {:?} · {}ms total",
                s.format,
                s.extracted_chars,
                s.extract_duration_ms,
                s.llm_duration_ms,
                s.parse_stage,
                s.total_duration_ms
            ))
        );
    }
}

/// Exit code by error class; anything not from the library is internal.
fn exit_code(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<AnalyzeError>().map(AnalyzeError::class) {
        Some(ErrorClass::ClientInput) => 2,
        Some(ErrorClass::Upstream) => 3,
        Some(ErrorClass::Unavailable) => 4,
        Some(ErrorClass::Internal) | None => 1,
    }
}
