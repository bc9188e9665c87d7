//! Text extraction: turn a file on disk into a [`Document`].
//!
//! Routing is by extension:
//!
//! | Extension | Body | Chunked as |
//! |-----------|------|------------|
//! | `.pdf` | pages (feature `pdf`) | prose, per page |
//! | `.md`, `.markdown` | text | markdown |
//! | `.html`, `.htm` | text of the parsed page | prose |
//! | `.txt`, `.text` | text | prose |
//! | `.json` | crawler records | one chunk per record |
//! | `.epub` | spine documents as numbered sections | prose, per section |
//!
//! Invalid UTF-8 is replaced rather than rejected.

use std::path::Path;

use crate::clean::html_to_text;
use crate::document::{normalize_doc_id, CrawlRecord, Document};
use crate::epub::read_epub_sections;
use crate::error::{Error, Result};

/// Recognized input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Portable Document Format.
    Pdf,
    /// Markdown.
    Markdown,
    /// HTML.
    Html,
    /// Plain text.
    Text,
    /// Crawler JSON records.
    Json,
    /// EPUB e-book.
    Epub,
}

impl SourceFormat {
    /// Detect the format from a file extension (case-insensitive, no dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "txt" | "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }

    /// Detect the format of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether this build can extract the format.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        match self {
            Self::Pdf => cfg!(feature = "pdf"),
            Self::Markdown | Self::Html | Self::Text | Self::Json | Self::Epub => true,
        }
    }
}

/// Extract `path` into a document whose chunks will be sourced as
/// `{collection}/{doc_id}`.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] for unknown extensions, and PDF when built
///   without the `pdf` feature
/// - [`Error::Io`] if the file cannot be read
/// - [`Error::Json`] if a `.json` file is not a JSON array
/// - [`Error::Pdf`] if PDF parsing fails
/// - [`Error::Epub`] if an EPUB archive is unreadable
pub fn extract_path(path: &Path, collection: &str) -> Result<Document> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        Error::UnsupportedFormat(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        )
    })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let doc_id = normalize_doc_id(&stem);
    let source = format!("{collection}/{doc_id}");

    match format {
        SourceFormat::Markdown => Ok(Document::markdown(doc_id, source, read_text(path)?)),
        SourceFormat::Text => Ok(Document::prose(doc_id, source, read_text(path)?)),
        SourceFormat::Html => {
            let raw = read_text(path)?;
            Ok(Document::prose(doc_id, source, html_to_text(&raw)))
        }
        SourceFormat::Json => {
            let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
            let records = parse_records(&bytes).map_err(|e| Error::json(path, e))?;
            Ok(Document::records(doc_id, source, records))
        }
        SourceFormat::Pdf => {
            let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
            Ok(Document::paged(doc_id, source, extract_pdf_pages(&bytes)?))
        }
        SourceFormat::Epub => {
            let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
            Ok(Document::paged(doc_id, source, read_epub_sections(&bytes)?))
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse crawler output: a JSON array of record objects.
///
/// Array entries that are not record-shaped (a bare string, a `text` that is
/// a number) become empty records and produce no chunks.
///
/// # Errors
///
/// Fails only if the input is not a JSON array.
pub fn parse_records(bytes: &[u8]) -> std::result::Result<Vec<CrawlRecord>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    Ok(values
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .collect())
}

/// Split extracted PDF text into one-based pages.
///
/// The extractor separates pages with form feeds. Blank pages keep their
/// number but produce no chunks.
#[cfg(feature = "pdf")]
fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<(u32, String)>> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Pdf(e.to_string()))?;
    Ok(split_pages(&text))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf_pages(_bytes: &[u8]) -> Result<Vec<(u32, String)>> {
    Err(Error::UnsupportedFormat(
        "pdf (built without the `pdf` feature)".to_string(),
    ))
}

#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
fn split_pages(text: &str) -> Vec<(u32, String)> {
    text.split('\x0C')
        .enumerate()
        .map(|(i, page)| (i as u32 + 1, page.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBody, DocumentKind};

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_extension("MD"), Some(SourceFormat::Markdown));
        assert_eq!(SourceFormat::from_extension("htm"), Some(SourceFormat::Html));
        assert_eq!(SourceFormat::from_extension("docx"), None);
        assert_eq!(
            SourceFormat::from_path(Path::new("a/b/Report.PDF")),
            Some(SourceFormat::Pdf)
        );
        assert!(SourceFormat::Epub.is_supported());
        assert!(SourceFormat::Json.is_supported());
    }

    #[test]
    fn test_split_pages() {
        let pages = split_pages("one\x0Ctwo\x0C\x0Cfour");
        assert_eq!(pages.len(), 4);
        assert_eq!(pages[0], (1, "one".to_string()));
        assert_eq!(pages[2], (3, String::new()));
        assert_eq!(pages[3], (4, "four".to_string()));
    }

    #[test]
    fn test_parse_records_lenient() {
        let records = parse_records(br#"[{"text": "a"}, "junk", {"text": 5}, {"content": "b"}]"#).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].body(), "a");
        assert_eq!(records[1].body(), "");
        assert_eq!(records[2].body(), "");
        assert_eq!(records[3].body(), "b");
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        assert!(parse_records(br#"{"text": "a"}"#).is_err());
        assert!(parse_records(b"not json").is_err());
    }

    #[test]
    fn test_extract_html_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("Home Page.html");
        std::fs::write(&html, "<html><body><p>Hello &amp; welcome.</p></body></html>").unwrap();
        let md = dir.path().join("guide.md");
        std::fs::write(&md, "# Guide\n\nBody.").unwrap();

        let doc = extract_path(&html, "site").unwrap();
        assert_eq!(doc.doc_id, "home_page");
        assert_eq!(doc.source, "site/home_page");
        assert_eq!(doc.kind, DocumentKind::Prose);
        assert_eq!(doc.body, DocumentBody::Text("Hello & welcome.".into()));

        let doc = extract_path(&md, "site").unwrap();
        assert_eq!(doc.kind, DocumentKind::Markdown);
    }

    #[test]
    fn test_extract_html_drops_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("menu.html");
        std::fs::write(
            &html,
            "<html><head><script>track('visit');</script></head>\
             <body><p>Caf&eacute; &times; 2</p></body></html>",
        )
        .unwrap();

        let doc = extract_path(&html, "site").unwrap();
        assert_eq!(doc.body, DocumentBody::Text("Caf\u{e9} \u{d7} 2".into()));
    }

    #[test]
    fn test_extract_epub_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Field Guide.epub");
        std::fs::write(&path, crate::epub::tests::sample_epub()).unwrap();

        let doc = extract_path(&path, "books").unwrap();
        assert_eq!(doc.doc_id, "field_guide");
        assert_eq!(doc.kind, DocumentKind::Prose);
        let DocumentBody::Pages(pages) = doc.body else {
            panic!("expected sections, got {:?}", doc.body);
        };
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, 1);
        assert!(pages[0].1.starts_with("Chapter One"));
        assert!(pages[1].1.contains("nobody noticed"));
    }

    #[test]
    fn test_extract_unsupported_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("book.epub");
        std::fs::write(&epub, b"PK").unwrap();
        assert!(matches!(extract_path(&epub, "c"), Err(Error::Epub(_))));

        let other = dir.path().join("sheet.xlsx");
        std::fs::write(&other, b"").unwrap();
        assert!(matches!(extract_path(&other, "c"), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_extract_missing_file() {
        let err = extract_path(Path::new("/nonexistent/dir/file.txt"), "c").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
