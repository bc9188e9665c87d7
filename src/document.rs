//! Documents: extracted text plus the provenance chunks inherit.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// How a document's text should be chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Running prose: sentence windows.
    Prose,
    /// Markdown: structure-aware chunking.
    Markdown,
}

/// One record of crawler output (a JSON array of these per file).
///
/// `text` is preferred over `content`; either may be absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecord {
    /// Extracted page text.
    #[serde(default)]
    pub text: Option<String>,
    /// Alternative text field used by some crawlers.
    #[serde(default)]
    pub content: Option<String>,
    /// Page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Markdown rendition of the page, if the crawler produced one.
    #[serde(default)]
    pub markdown: Option<String>,
    /// Free-form crawler metadata.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl CrawlRecord {
    /// The record's body text, preferring `text` over `content`.
    ///
    /// An empty `text` falls through to `content`.
    #[must_use]
    pub fn body(&self) -> &str {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.content.as_deref())
            .unwrap_or_default()
    }
}

/// Extracted document content.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    /// One run of text.
    Text(String),
    /// One-based page numbers with their text (PDF).
    Pages(Vec<(u32, String)>),
    /// Pre-chunked crawler records.
    Records(Vec<CrawlRecord>),
}

impl DocumentBody {
    /// Whether there is no text at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Pages(pages) => pages.iter().all(|(_, t)| t.trim().is_empty()),
            Self::Records(records) => records.iter().all(|r| r.body().trim().is_empty()),
        }
    }
}

/// A source document ready for chunking.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Normalized identifier (see [`normalize_doc_id`]).
    pub doc_id: String,
    /// Chunk `source` value, `{collection}/{doc_id}`.
    pub source: String,
    /// Extracted content.
    pub body: DocumentBody,
    /// How to chunk `body`.
    pub kind: DocumentKind,
}

impl Document {
    /// A prose document.
    #[must_use]
    pub fn prose(doc_id: impl Into<String>, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            source: source.into(),
            body: DocumentBody::Text(text.into()),
            kind: DocumentKind::Prose,
        }
    }

    /// A markdown document.
    #[must_use]
    pub fn markdown(doc_id: impl Into<String>, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            source: source.into(),
            body: DocumentBody::Text(text.into()),
            kind: DocumentKind::Markdown,
        }
    }

    /// A paged prose document.
    #[must_use]
    pub fn paged(doc_id: impl Into<String>, source: impl Into<String>, pages: Vec<(u32, String)>) -> Self {
        Self {
            doc_id: doc_id.into(),
            source: source.into(),
            body: DocumentBody::Pages(pages),
            kind: DocumentKind::Prose,
        }
    }

    /// A crawler record set.
    #[must_use]
    pub fn records(doc_id: impl Into<String>, source: impl Into<String>, records: Vec<CrawlRecord>) -> Self {
        Self {
            doc_id: doc_id.into(),
            source: source.into(),
            body: DocumentBody::Records(records),
            kind: DocumentKind::Prose,
        }
    }
}

/// Normalize a file stem into a document id.
///
/// Accented letters are decomposed (NFKD) and lose their marks, so `é`
/// becomes `e`. Then lowercases, drops what is still non-ASCII, collapses
/// every run of other characters into one `_` and trims `_` from both ends.
///
/// ```rust
/// use ragprep::normalize_doc_id;
///
/// assert_eq!(normalize_doc_id("Setup Guide (v2)"), "setup_guide_v2");
/// assert_eq!(normalize_doc_id("Café--Menü"), "cafe_menu");
/// assert_eq!(normalize_doc_id("___"), "");
/// ```
#[must_use]
pub fn normalize_doc_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            id.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_doc_id() {
        assert_eq!(normalize_doc_id("My Report 2024"), "my_report_2024");
        assert_eq!(normalize_doc_id("  --leading and trailing--  "), "leading_and_trailing");
        assert_eq!(normalize_doc_id("a...b___c"), "a_b_c");
        assert_eq!(normalize_doc_id("日本語"), "");
    }

    #[test]
    fn test_normalize_doc_id_transliterates_accents() {
        assert_eq!(normalize_doc_id("Café Menü"), "cafe_menu");
        assert_eq!(normalize_doc_id("Résumé Ñandú"), "resume_nandu");
        assert_eq!(normalize_doc_id("ﬁnal Report²"), "final_report2");
        assert_ne!(normalize_doc_id("Café"), normalize_doc_id("Caf"));
    }

    #[test]
    fn test_crawl_record_body_preference() {
        let record: CrawlRecord =
            serde_json::from_str(r#"{"text": "", "content": "fallback", "url": "https://x.y/z"}"#).unwrap();
        assert_eq!(record.body(), "fallback");

        let record: CrawlRecord = serde_json::from_str(r#"{"text": "primary", "content": "other"}"#).unwrap();
        assert_eq!(record.body(), "primary");

        let record: CrawlRecord = serde_json::from_str(r#"{"text": null}"#).unwrap();
        assert_eq!(record.body(), "");
    }

    #[test]
    fn test_body_is_empty() {
        assert!(DocumentBody::Text("  \n".into()).is_empty());
        assert!(DocumentBody::Pages(vec![(1, String::new())]).is_empty());
        assert!(!DocumentBody::Pages(vec![(1, String::new()), (2, "x".into())]).is_empty());
        assert!(DocumentBody::Records(vec![]).is_empty());
    }
}
