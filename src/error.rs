//! Error types for the resume-sync library.
//!
//! Every failure the update flow can hit is a [`SyncError`]. The orchestrator
//! never lets one escape to the interactive shell: it is wrapped in
//! [`crate::output::SyncOutcome::Aborted`] and reported to the operator, and the
//! shell moves on to the next command.
//!
//! Nothing in the flow is applied partially. An error raised before the
//! writing step leaves the target HTML file exactly as it was.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the resume-sync library.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The HTML file to update does not exist.
    #[error("HTML file not found: '{path}'\nTry `ls` to see the HTML files in the project root.")]
    HtmlNotFound { path: PathBuf },

    /// The source-of-truth PDF does not exist.
    #[error("PDF resume not found: '{path}'\nCheck --pdf or the project root.")]
    PdfNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading an input file failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error that retrying will not fix.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// Every attempt failed with a transient error.
    #[error("LLM failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    // ── Validation errors ─────────────────────────────────────────────────
    /// The model output contains no doctype or `<html` tag anywhere.
    #[error("Model output does not contain an HTML document.\nFirst characters of output:\n{excerpt}")]
    NoDocumentRoot { excerpt: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Copying the current document to its backup slot failed.
    #[error("Failed to create backup '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the updated HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not persist the response cache.
    #[error("Failed to write response cache '{path}': {source}")]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Map an I/O error on an input file to the matching variant.
    pub(crate) fn from_read(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => SyncError::PermissionDenied { path },
            _ => SyncError::ReadFailed { path, source },
        }
    }
}
