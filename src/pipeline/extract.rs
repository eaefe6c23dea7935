//! Text extraction from the two input documents.
//!
//! The HTML page is read as text with a lossy UTF-8 decode: byte sequences
//! that are not valid UTF-8 become U+FFFD instead of failing the run, so a
//! page saved in a legacy encoding still goes through.
//!
//! The PDF is read through pdfium, one page at a time in document order.
//! A page whose text layer is missing or unreadable contributes an empty
//! string; the page texts are joined with `\n` and the result trimmed.

use crate::error::SyncError;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read an HTML file, replacing undecodable bytes with U+FFFD.
pub fn read_html(path: &Path) -> Result<String, SyncError> {
    if !path.exists() {
        return Err(SyncError::HtmlNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| SyncError::from_read(path.to_path_buf(), e))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    debug!("Read {} bytes of HTML from {}", bytes.len(), path.display());
    Ok(text)
}

/// Produces the plain text of a PDF.
pub trait PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, SyncError>;
}

/// [`PdfTextExtractor`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    lib_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    /// Bind to the system pdfium library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium library at `path`.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            lib_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, SyncError> {
        let bindings = match self.lib_path {
            Some(ref path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| SyncError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PdfTextExtractor for PdfiumExtractor {
    fn extract(&self, path: &Path) -> Result<String, SyncError> {
        check_pdf_magic(path)?;

        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| SyncError::CorruptPdf {
                path: path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        let pages: Vec<String> = document
            .pages()
            .iter()
            .enumerate()
            .map(|(idx, page)| match page.text() {
                Ok(text) => text.all(),
                Err(e) => {
                    debug!("Page {} has no extractable text: {:?}", idx + 1, e);
                    String::new()
                }
            })
            .collect();

        info!("Extracted text from {} PDF pages", pages.len());
        Ok(join_pages(&pages))
    }
}

/// Join per-page texts with newlines and trim the result.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Validate existence, readability and the `%PDF` magic bytes.
fn check_pdf_magic(path: &Path) -> Result<(), SyncError> {
    if !path.exists() {
        return Err(SyncError::PdfNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file =
        std::fs::File::open(path).map_err(|e| SyncError::from_read(path.to_path_buf(), e))?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(SyncError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<html>\n  <p>Café</p>\n</html>\n").unwrap();
        assert_eq!(read_html(&path).unwrap(), "<html>\n  <p>Café</p>\n</html>\n");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.html");
        // 0xE9 is "é" in Latin-1 and invalid on its own in UTF-8.
        std::fs::write(&path, b"<p>caf\xE9</p>").unwrap();
        let text = read_html(&path).unwrap();
        assert_eq!(text, "<p>caf\u{FFFD}</p>");
    }

    #[test]
    fn missing_html_is_reported() {
        let err = read_html(Path::new("/definitely/not/here.html")).unwrap_err();
        assert!(matches!(err, SyncError::HtmlNotFound { .. }));
    }

    #[test]
    fn missing_pdf_is_reported_before_binding() {
        let err = PdfiumExtractor::new()
            .extract(Path::new("/definitely/not/here.pdf"))
            .unwrap_err();
        assert!(matches!(err, SyncError::PdfNotFound { .. }));
    }

    #[test]
    fn non_pdf_is_rejected_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, "<html>not a pdf</html>").unwrap();
        let err = PdfiumExtractor::new().extract(&path).unwrap_err();
        match err {
            SyncError::NotAPdf { magic, .. } => assert_eq!(&magic, b"<htm"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pages_join_with_newlines_and_trim() {
        let pages = vec!["  Jane Doe", "", "Experience\n", "Skills  \n\n"];
        assert_eq!(join_pages(&pages), "Jane Doe\n\nExperience\n\nSkills");
    }

    #[test]
    fn no_pages_is_empty_text() {
        let pages: Vec<String> = Vec::new();
        assert_eq!(join_pages(&pages), "");
    }
}
