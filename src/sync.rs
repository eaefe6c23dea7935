//! The update flow: PDF + HTML in, confirmed HTML file out.
//!
//! ```text
//! Loading ─▶ Extracting ─▶ Prompting ─▶ CacheHit | Generating ─▶ Validating
//!    │            │                              │                   │
//!    └────────────┴──────────── Aborted ◀────────┴───────────────────┘
//!
//! Validating ─▶ PreviewShown ─▶ Confirmed ─▶ BackingUp ─▶ Writing ─▶ Done
//!                                   │
//!                                   └─▶ Cancelled
//! ```
//!
//! [`Synchronizer::prepare`] runs everything up to validation and never
//! writes the target. [`Synchronizer::apply`] does the backup and the write.
//! [`Synchronizer::update`] wires both together with the preview and the
//! operator's confirmation, and turns every failure into
//! [`SyncOutcome::Aborted`] so the shell keeps running.

use crate::cache::ResponseCache;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::operator::{Operator, Tone};
use crate::output::{line_count, Candidate, SyncOutcome, SyncReport};
use crate::pipeline::apply::{backup_path, create_backup, write_document};
use crate::pipeline::extract::{read_html, PdfTextExtractor};
use crate::pipeline::llm::CompletionClient;
use crate::pipeline::validate::{excerpt, locate_document, soft_checks};
use crate::prompts::build_messages;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns everything one update needs: settings, cache, model client, PDF reader.
pub struct Synchronizer {
    config: SyncConfig,
    cache: ResponseCache,
    client: CompletionClient,
    extractor: Box<dyn PdfTextExtractor>,
}

impl Synchronizer {
    pub fn new(
        config: SyncConfig,
        cache: ResponseCache,
        client: CompletionClient,
        extractor: Box<dyn PdfTextExtractor>,
    ) -> Self {
        Self {
            config,
            cache,
            client,
            extractor,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Run a full update of `root/html_rel` and report how it ended.
    pub fn update(
        &mut self,
        root: &Path,
        html_rel: &Path,
        operator: &mut dyn Operator,
    ) -> SyncOutcome {
        let start = Instant::now();

        let candidate = match self.prepare(root, html_rel, operator) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Update aborted: {}", e);
                operator.notify(Tone::Error, &format!("✗ {e}"));
                return SyncOutcome::Aborted(e);
            }
        };

        // ── PreviewShown ─────────────────────────────────────────────────
        let n = self.config.preview_chars;
        operator.notify(Tone::Info, &format!("\n=== PREVIEW (first {n} chars) ==="));
        operator.notify(Tone::Info, excerpt(&candidate.html, n));
        for warning in &candidate.warnings {
            operator.notify(Tone::Warning, &format!("⚠ Warning: {warning}"));
        }

        // ── Confirmed | Cancelled ────────────────────────────────────────
        if !operator.confirm("\nApply FULL HTML update?") {
            info!("Update of {} cancelled by operator", candidate.target.display());
            operator.notify(Tone::Warning, "✗ Update cancelled.");
            return SyncOutcome::Cancelled;
        }

        match self.apply(&candidate, operator) {
            Ok(report) => {
                info!(
                    "Updated {} in {}ms",
                    report.target.display(),
                    start.elapsed().as_millis()
                );
                announce(&report, operator);
                SyncOutcome::Done(report)
            }
            Err(e) => {
                warn!("Update aborted: {}", e);
                operator.notify(Tone::Error, &format!("✗ {e}"));
                SyncOutcome::Aborted(e)
            }
        }
    }

    /// Loading through Validating. Never writes the target.
    pub fn prepare(
        &mut self,
        root: &Path,
        html_rel: &Path,
        operator: &mut dyn Operator,
    ) -> Result<Candidate, SyncError> {
        // ── Loading ──────────────────────────────────────────────────────
        let html_path = root.join(html_rel);
        let pdf_path = root.join(&self.config.pdf_relative_path);
        if !html_path.exists() {
            return Err(SyncError::HtmlNotFound { path: html_path });
        }
        if !pdf_path.exists() {
            return Err(SyncError::PdfNotFound { path: pdf_path });
        }

        // ── Extracting ───────────────────────────────────────────────────
        operator.notify(Tone::Info, &format!("Reading HTML: {}", html_path.display()));
        let html = read_html(&html_path)?;

        operator.notify(Tone::Info, &format!("Reading PDF: {}", pdf_path.display()));
        let pdf_text = self.extractor.extract(&pdf_path)?;

        operator.notify(
            Tone::Info,
            &format!(
                "PDF text length: {} characters\nHTML content length: {} characters",
                pdf_text.chars().count(),
                html.chars().count()
            ),
        );

        // ── Prompting → CacheHit | Generating ────────────────────────────
        let request = build_messages(&html_path, &html, &pdf_text, self.config.checklist.as_deref());
        debug!("Request fingerprint {}", request.fingerprint());

        operator.notify(Tone::Info, "Generating updated HTML…");
        let client = &self.client;
        let (response, cache_hit) = self
            .cache
            .get_or_generate(&request, |req| client.complete(req))?;
        if cache_hit {
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_generation_complete(response.chars().count(), true);
            }
            operator.notify(Tone::Info, "Using cached response.");
        }

        // ── Validating ───────────────────────────────────────────────────
        let located = locate_document(
            &response,
            self.config.marker_window,
            self.config.diagnostic_chars,
        )?;
        match located.trimmed_offset {
            Some(offset) if located.outside_window => {
                warn!("Dropped {} bytes before the HTML root", offset);
                operator.notify(
                    Tone::Warning,
                    &format!("⚠ Found HTML starting at position {offset}, trimming…"),
                );
            }
            Some(offset) => info!("Dropped {} bytes of preamble before the HTML root", offset),
            None => {}
        }

        let warnings = soft_checks(
            &located.html,
            self.config.min_output_chars,
            &self.config.expected_markers,
        );
        for warning in &warnings {
            warn!("{}", warning);
        }

        let markers = if self.config.success_markers.is_empty() {
            default_markers(&pdf_text)
        } else {
            self.config.success_markers.clone()
        };

        Ok(Candidate {
            target: html_path,
            original: html,
            html: located.html,
            cache_hit,
            trimmed_offset: located.trimmed_offset,
            warnings,
            markers,
        })
    }

    /// BackingUp through Done, for a candidate the operator already accepted.
    ///
    /// When a backup already exists the operator chooses whether to replace
    /// it. Declining keeps the old backup and writes without a new one.
    pub fn apply(
        &self,
        candidate: &Candidate,
        operator: &mut dyn Operator,
    ) -> Result<SyncReport, SyncError> {
        // ── BackingUp ────────────────────────────────────────────────────
        let suffix = self.config.backup_suffix.as_str();
        let slot = backup_path(&candidate.target, suffix);
        let take_backup = !slot.exists()
            || operator.confirm(&format!(
                "Backup exists at {}. Overwrite it with a new backup?",
                slot.display()
            ));

        let backup = if take_backup {
            let backup = create_backup(&candidate.target, suffix)?;
            operator.notify(Tone::Info, &format!("Backup created: {}", backup.display()));
            Some(backup)
        } else {
            warn!("Writing {} without a fresh backup", candidate.target.display());
            operator.notify(
                Tone::Warning,
                &format!("⚠ Keeping existing backup {}; no new backup taken.", slot.display()),
            );
            None
        };

        // ── Writing ──────────────────────────────────────────────────────
        write_document(&candidate.target, &candidate.html)?;

        // ── Done ─────────────────────────────────────────────────────────
        let markers = candidate
            .markers
            .iter()
            .map(|m| (m.clone(), candidate.html.contains(m.as_str())))
            .collect();

        Ok(SyncReport {
            target: candidate.target.clone(),
            backup,
            cache_hit: candidate.cache_hit,
            lines_before: line_count(&candidate.original),
            lines_after: line_count(&candidate.html),
            markers,
            warnings: candidate.warnings.clone(),
        })
    }
}

/// Longest first line of PDF text still treated as a heading.
const MAX_MARKER_CHARS: usize = 80;

/// The first non-empty line of the PDF text, if it is short enough to be a
/// heading. Resumes open with the person's name.
fn default_markers(pdf_text: &str) -> Vec<String> {
    pdf_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.chars().count() <= MAX_MARKER_CHARS)
        .map(|line| vec![line.to_string()])
        .unwrap_or_default()
}

fn announce(report: &SyncReport, operator: &mut dyn Operator) {
    operator.notify(Tone::Success, "✔ Resume synchronized successfully.");
    operator.notify(
        Tone::Info,
        &format!("Lines changed: {} → {}", report.lines_before, report.lines_after),
    );
    for (marker, present) in &report.markers {
        if *present {
            operator.notify(Tone::Success, &format!("✓ {marker}"));
        } else {
            operator.notify(Tone::Warning, &format!("⚠ Not found after update: {marker}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_marker_is_first_nonempty_line() {
        assert_eq!(default_markers("\n  Jane Doe  \nEngineer"), vec!["Jane Doe"]);
    }

    #[test]
    fn no_default_marker_for_empty_or_long_text() {
        assert!(default_markers("").is_empty());
        assert!(default_markers("   \n\n").is_empty());
        assert!(default_markers(&"x".repeat(200)).is_empty());
    }
}
