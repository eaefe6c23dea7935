//! Validation of the raw model response before anything touches disk.
//!
//! Models often prepend chatter ("Here is the updated file:") to the
//! document. [`locate_document`] looks for a root marker, either a doctype
//! declaration or an opening `<html` tag, case-insensitively:
//!
//! 1. Marker at the start: the text is accepted as-is.
//! 2. Marker further in: everything before the first marker is dropped.
//!    A marker past the leading window is flagged so the caller can warn.
//! 3. No marker anywhere: [`SyncError::NoDocumentRoot`] with an excerpt.
//!
//! [`soft_checks`] adds warnings (too short, expected text missing) that
//! never block the flow.

use crate::error::SyncError;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_ROOT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype\s+html|<html[\s>]").unwrap());

/// The part of a response that will be written, plus where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedDocument {
    pub html: String,
    /// Byte offset of the first marker when leading text was trimmed.
    pub trimmed_offset: Option<usize>,
    /// The marker lay past the leading window.
    pub outside_window: bool,
}

/// Find the HTML document in `response`.
///
/// Surrounding whitespace is removed first. `window` is measured in
/// characters from the start of the trimmed text.
pub fn locate_document(
    response: &str,
    window: usize,
    diagnostic_chars: usize,
) -> Result<LocatedDocument, SyncError> {
    let text = response.trim();

    let Some(marker) = RE_ROOT_MARKER.find(text) else {
        return Err(SyncError::NoDocumentRoot {
            excerpt: excerpt(text, diagnostic_chars).to_string(),
        });
    };

    let offset = marker.start();
    if offset == 0 {
        return Ok(LocatedDocument {
            html: text.to_string(),
            trimmed_offset: None,
            outside_window: false,
        });
    }

    Ok(LocatedDocument {
        html: text[offset..].to_string(),
        trimmed_offset: Some(offset),
        outside_window: offset >= byte_len_of_chars(text, window),
    })
}

/// Non-blocking warnings about a located document.
pub fn soft_checks(html: &str, min_chars: usize, expected: &[String]) -> Vec<String> {
    let mut warnings = Vec::new();

    let chars = html.chars().count();
    if chars < min_chars {
        warnings.push(format!("Updated HTML seems very short ({chars} chars)"));
    }
    for marker in expected {
        if !html.contains(marker.as_str()) {
            warnings.push(format!("Expected text not found in output: {marker:?}"));
        }
    }

    warnings
}

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    &text[..byte_len_of_chars(text, max_chars)]
}

/// Byte length of the first `n` characters of `text`.
fn byte_len_of_chars(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}
