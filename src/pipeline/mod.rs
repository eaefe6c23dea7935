//! Pipeline stages for one resume update.
//!
//! Each submodule implements exactly one step, so each is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ (prompts) ──▶ llm ──▶ validate ──▶ apply
//! (HTML+PDF)               (retry)  (root marker) (backup + write)
//! ```
//!
//! 1. [`extract`]  — read the HTML page and the PDF text
//! 2. [`llm`]      — drive the completion call with retry/backoff; the only
//!    stage with network I/O
//! 3. [`validate`] — find the HTML document in the response, soft checks
//! 4. [`apply`]    — single-slot backup, then full-file overwrite

pub mod apply;
pub mod extract;
pub mod llm;
pub mod validate;
