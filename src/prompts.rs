//! Prompts for merging a PDF resume into an HTML resume page.
//!
//! Both documents are embedded verbatim. Nothing is truncated or chunked, so
//! the HTML page and the PDF text together must fit in the model's input
//! window; there is no fallback when they do not.
//!
//! Callers can replace the edit checklist via
//! [`crate::config::SyncConfig::checklist`]; the system instruction is fixed.

use crate::request::{Message, Request};
use std::path::Path;

/// Fixed editing rules sent as the system message.
pub const SYSTEM_PROMPT: &str = r#"You are a Senior Staff Software Engineer tasked with synchronizing an HTML resume page with a PDF resume.

CRITICAL RULES:
1. Preserve EXACT HTML structure, CSS classes, IDs, and formatting
2. Update text content ONLY - never modify HTML tags, attributes, or layout
3. Match sections semantically (Experience, Skills, Projects, Education, etc.)
4. For entities in both HTML and PDF: update HTML content to match PDF
5. For entities only in PDF: add them to appropriate sections
6. For entities only in HTML: keep them unchanged (DO NOT DELETE)
7. Maintain chronological order where applicable
8. Keep all original HTML comments and conditional code
9. Return the FULL, complete HTML file - not just changes

PRIORITY SECTIONS TO SYNC:
1. Summary/Introduction
2. Work Experience
3. Technical Skills
4. Projects
5. Certifications and Awards
6. Languages
7. Education
8. Interests
9. Professional Skills

HTML STRUCTURE PRESERVATION:
- Keep all <div>, <section>, <ul>, <li> with same classes/IDs
- Maintain same number of columns and layout
- Preserve all social links, navigation, headers, footers
- Keep all script and style tags exactly as-is
- Maintain any theme toggles and configuration panels"#;

/// Default edit checklist embedded in the user message.
pub const DEFAULT_CHECKLIST: &str = r#"1. SUMMARY / INTRODUCTION:
   - Update to match the PDF summary exactly

2. WORK EXPERIENCE (reverse chronological order):
   - Update titles, dates and locations of roles present in both documents
   - Replace bullet points with the PDF bullet points
   - Add roles that only appear in the PDF

3. TECHNICAL SKILLS:
   - Reorganise into the PDF's skill groups
   - Include every skill listed in the PDF
   - Keep the HTML list structure, update list items only

4. PROJECTS:
   - Align project entries with the PDF

5. CERTIFICATIONS, LANGUAGES, EDUCATION, INTERESTS:
   - Match the PDF order, names and spelling

6. TAGLINE AND CONTACT LINKS:
   - Update to match the PDF header"#;

/// Build the two-message request for one update.
///
/// ## Message Layout
///
/// 1. **System message** — [`SYSTEM_PROMPT`]
/// 2. **User message** — the PDF text (source of truth), the full HTML file
///    labelled with its path, and the edit checklist
pub fn build_messages(
    html_path: &Path,
    html_content: &str,
    pdf_text: &str,
    checklist: Option<&str>,
) -> Request {
    let checklist = checklist.unwrap_or(DEFAULT_CHECKLIST);
    let user = format!(
        "TASK: Synchronize the HTML resume content with the PDF resume content.\n\n\
PDF RESUME (SOURCE OF TRUTH):\n{pdf_text}\n\
CURRENT HTML FILE ({path}):\n{html_content}\n\n\n\
SPECIFIC UPDATES REQUIRED:\n\n{checklist}\n\n\
IMPORTANT: Preserve ALL HTML structure, classes, IDs, and formatting. Only update text content.\n\
Return the COMPLETE updated HTML file.",
        path = html_path.display(),
    );

    Request::new(vec![Message::system(SYSTEM_PROMPT), Message::user(user)])
}
