//! CLI binary for resume-sync.
//!
//! A thin shim over the library crate: maps flags (and `.env` values) to
//! `SyncConfig`, asks for the project root, and hands the terminal to the
//! interactive shell.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume_sync::{
    CompletionClient, ConsoleOperator, LazyProviderCompleter, Operator, PdfiumExtractor,
    ResponseCache, Shell, SyncConfig, SyncProgressCallback, Synchronizer, Tone,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the model is generating. Created on
/// `on_generation_start`, cleared when generation ends either way.
struct SpinnerCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl SyncProgressCallback for SpinnerCallback {
    fn on_generation_start(&self, prompt_chars: usize) {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Generating");
        bar.set_message(format!("{prompt_chars} prompt chars"));
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_generation_retry(&self, attempt: u32, max_attempts: u32, error: &str) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(ref bar) = *slot {
                // Truncate very long error messages to keep output tidy.
                let msg: String = error.chars().take(80).collect();
                bar.println(format!("  ⚠ attempt {attempt}/{max_attempts} failed: {msg}"));
                bar.set_message(format!("retrying ({}/{max_attempts})", attempt + 1));
            }
        }
    }

    fn on_generation_complete(&self, _response_chars: usize, _cached: bool) {
        self.finish();
    }

    fn on_generation_error(&self, _error: &str) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask for the project root interactively
  resume-sync

  # Point at a site checkout, OpenAI provider
  resume-sync --root ~/src/me.github.io --provider openai --model gpt-4.1

  # Custom edit checklist and sanity markers
  resume-sync --checklist checklist.txt --expect "Jane Doe" --expect "Software Engineer"

SHELL COMMANDS:
  update <htmlfile>  Update a specific HTML file (relative to the root)
  update resume      Update resume.html, index.html, templates/resume.html
                     or pages/resume.html, whichever exists first
  ls                 List HTML files in the root
  exit               Quit

ENVIRONMENT VARIABLES (also read from ./.env):
  OPENAI_API_KEY          OpenAI API key (or the key of the chosen provider)
  RESUME_SYNC_PROVIDER    Provider (openai, anthropic, gemini, openrouter, ollama)
  RESUME_SYNC_MODEL       Model ID
  PDFIUM_LIB_PATH         Path to libpdfium; default is the system library
"#;

/// Synchronise an HTML resume page with a PDF resume using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "resume-sync",
    version,
    about = "Synchronise an HTML resume page with a PDF resume using an LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Project root. Prompted for when omitted.
    #[arg(long, env = "RESUME_SYNC_ROOT")]
    root: Option<PathBuf>,

    /// PDF path relative to the project root.
    #[arg(long, env = "RESUME_SYNC_PDF", default_value = resume_sync::config::DEFAULT_PDF_RELATIVE_PATH)]
    pdf: PathBuf,

    /// LLM model ID.
    #[arg(long, env = "RESUME_SYNC_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, openrouter, ollama, azure.
    #[arg(long, env = "RESUME_SYNC_PROVIDER")]
    provider: Option<String>,

    /// Response cache file.
    #[arg(long, env = "RESUME_SYNC_CACHE", default_value = resume_sync::config::DEFAULT_CACHE_FILENAME)]
    cache_file: PathBuf,

    /// Text file replacing the built-in edit checklist.
    #[arg(long, env = "RESUME_SYNC_CHECKLIST")]
    checklist: Option<PathBuf>,

    /// Text the updated page must contain (warning only), also reported
    /// after writing. Repeatable. Without it, the first line of the PDF
    /// text is reported.
    #[arg(long = "expect", value_name = "TEXT")]
    expect: Vec<String>,

    /// Max LLM output tokens.
    #[arg(long, env = "RESUME_SYNC_MAX_TOKENS", default_value_t = 12_000)]
    max_tokens: usize,

    /// Per-attempt LLM timeout in seconds.
    #[arg(long, env = "RESUME_SYNC_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Seconds to wait before an uncached model call.
    #[arg(long, env = "RESUME_SYNC_REQUEST_DELAY", default_value_t = 15)]
    request_delay: u64,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress everything but errors in the logs.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Load .env before clap reads `env =` fallbacks; a missing file is fine.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let color = io::stdout().is_terminal();
    let mut operator = ConsoleOperator::new(color);

    println!("{}", "=".repeat(60));
    println!("Resume Sync Agent");
    println!("{}", "=".repeat(60));

    // ── Project root ─────────────────────────────────────────────────────
    let root = match cli.root.clone() {
        Some(root) => root,
        None => prompt_root(&mut operator)?,
    };
    if !root.exists() {
        operator.notify(Tone::Error, &format!("✗ Path does not exist: {}", root.display()));
        bail!("project root {} does not exist", root.display());
    }

    // ── Build config, client and shell ───────────────────────────────────
    // Provider resolution waits for the first cache miss.
    let config = build_config(&cli)?;
    let completer = LazyProviderCompleter::new(config.clone());
    let client = CompletionClient::from_config(Box::new(completer), &config);
    let cache = ResponseCache::load(&config.cache_path);
    let extractor = match config.pdfium_lib_path {
        Some(ref path) => PdfiumExtractor::with_library(path),
        None => PdfiumExtractor::new(),
    };

    let synchronizer = Synchronizer::new(config, cache, client, Box::new(extractor));
    Shell::new(root, synchronizer).run(&mut operator);

    Ok(())
}

/// Ask for the project root, defaulting to the current directory.
fn prompt_root(operator: &mut dyn Operator) -> Result<PathBuf> {
    let default = std::env::current_dir().context("Cannot determine the current directory")?;
    let answer = operator
        .read_line(&format!("Project root [{}]: ", default.display()))
        .unwrap_or_default();
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default
    } else {
        PathBuf::from(answer)
    })
}

/// Map CLI args to `SyncConfig`.
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let mut builder = SyncConfig::builder()
        .pdf_relative_path(&cli.pdf)
        .cache_path(&cli.cache_file)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .request_delay_secs(cli.request_delay)
        .progress_callback(SpinnerCallback::new());

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = cli.checklist {
        let checklist = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read checklist from {:?}", path))?;
        builder = builder.checklist(checklist);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }
    for marker in &cli.expect {
        builder = builder.expected_marker(marker).success_marker(marker);
    }

    builder.build().context("Invalid configuration")
}
