//! Result types of an update.

use crate::error::SyncError;
use std::path::PathBuf;

/// A validated model response that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The HTML file this candidate would replace.
    pub target: PathBuf,
    /// Content of the target when it was read.
    pub original: String,
    /// The HTML that would be written.
    pub html: String,
    /// `true` when the response came from the cache.
    pub cache_hit: bool,
    /// Byte offset of the root marker when leading text was dropped.
    pub trimmed_offset: Option<usize>,
    /// Soft-check warnings.
    pub warnings: Vec<String>,
    /// Literal text to report present/absent once written.
    pub markers: Vec<String>,
}

/// Summary of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub target: PathBuf,
    /// Backup taken before writing, if the operator allowed one.
    pub backup: Option<PathBuf>,
    pub cache_hit: bool,
    pub lines_before: usize,
    pub lines_after: usize,
    /// Each configured success marker and whether the written file contains it.
    pub markers: Vec<(String, bool)>,
    pub warnings: Vec<String>,
}

/// How an update ended.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The target was replaced.
    Done(SyncReport),
    /// The operator declined; nothing was written.
    Cancelled,
    /// A step failed; nothing was written.
    Aborted(SyncError),
}

impl SyncOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, SyncOutcome::Done(_))
    }

    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Done(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Aborted(e) => Some(e),
            _ => None,
        }
    }
}

/// Newline count, the coarse size measure shown after a write.
pub fn line_count(text: &str) -> usize {
    text.matches('\n').count()
}
