//! # resume-sync
//!
//! Keep a personal HTML resume page in step with a PDF resume, the source
//! of truth, by letting a large language model merge the two.
//!
//! The model receives the full HTML file and the full PDF text, and returns
//! a complete HTML file with the text updated and the markup left alone.
//! The operator previews the result and confirms before anything is
//! written; the previous file goes to a single backup slot first.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML file + PDF
//!  │
//!  ├─ 1. Extract   read HTML (lossy UTF-8) and PDF text (pdfium)
//!  ├─ 2. Prompt    system rules + both documents, verbatim
//!  ├─ 3. Generate  response cache, else model call with linear backoff
//!  ├─ 4. Validate  find the <!DOCTYPE html>/<html root, soft checks
//!  ├─ 5. Confirm   preview + operator y/N
//!  └─ 6. Apply     single-slot backup, full-file write
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_sync::{
//!     resolve_provider, CompletionClient, ConsoleOperator, PdfiumExtractor,
//!     ProviderCompleter, ResponseCache, SyncConfig, Synchronizer,
//! };
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::builder().provider_name("openai").build()?;
//!     let provider = resolve_provider(&config)?;
//!     let client = CompletionClient::from_config(
//!         Box::new(ProviderCompleter::new(provider, &config)?),
//!         &config,
//!     );
//!     let cache = ResponseCache::load(&config.cache_path);
//!     let mut sync = Synchronizer::new(config, cache, client, Box::new(PdfiumExtractor::new()));
//!
//!     let outcome = sync.update(Path::new("."), Path::new("index.html"), &mut ConsoleOperator::new(true));
//!     println!("done: {}", outcome.is_done());
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Everything runs on the calling thread and blocks: file I/O, the model
//! call and operator prompts. The cache file and the target HTML file are
//! not locked, so do not run two instances against the same project root
//! or cache file at once.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-sync` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod error;
pub mod operator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod shell;
pub mod sync;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::ResponseCache;
pub use config::{SyncConfig, SyncConfigBuilder};
pub use error::SyncError;
pub use operator::{ConsoleOperator, Operator, Tone};
pub use output::{Candidate, SyncOutcome, SyncReport};
pub use pipeline::extract::{PdfTextExtractor, PdfiumExtractor};
pub use pipeline::llm::{
    resolve_provider, Attempt, Completer, CompletionClient, LazyProviderCompleter,
    ProviderCompleter, RetryPolicy, Sleeper,
};
pub use progress::{NoopProgressCallback, ProgressCallback, SyncProgressCallback};
pub use request::{Message, Request, Role};
pub use shell::{Command, Shell};
pub use sync::Synchronizer;
