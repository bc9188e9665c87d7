//! Chunk types: raw passages from a chunker, and assembled chunks with metadata.
//!
//! Chunking happens in two steps:
//!
//! ```text
//! text ──chunker──> Passage*  ──assembler──> Chunk*
//!                   (text + structure)      (content + source + metadata)
//! ```
//!
//! A [`Passage`] is what a chunker knows: the text it cut, its position in the
//! sequence, and any structural context (headings, a title). A [`Chunk`] is the
//! persisted record: the passage text plus provenance copied from the document,
//! a stable `chunk_id`, and a token estimate.

use serde::{Deserialize, Serialize};

/// A candidate chunk produced by a chunker, before assembly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Passage {
    /// The passage text.
    pub text: String,
    /// Zero-based index of this passage in the chunker's output.
    pub index: usize,
    /// Enclosing heading titles, outermost first.
    pub headings: Vec<String>,
    /// First heading found inside the passage (paragraph-window policy).
    pub title: Option<String>,
}

impl Passage {
    /// Create a passage with no structural context.
    #[must_use]
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            index,
            headings: Vec::new(),
            title: None,
        }
    }

    /// Attach the enclosing heading path.
    #[must_use]
    pub fn with_headings(mut self, headings: Vec<String>) -> Self {
        self.headings = headings;
        self
    }

    /// Attach a title.
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// The length of this passage in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether this passage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Provenance and bookkeeping attached to every chunk.
///
/// `doc_id` is always present. Everything else depends on where the chunk came
/// from: PDF chunks carry `page_number`, markdown chunks carry `headings` and
/// `section_path`, crawler records carry `url`. Keys this type does not know
/// about (from upstream crawler output) are kept in `extra` so a chunk file
/// survives a read/write cycle unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Normalized identifier of the originating document.
    pub doc_id: String,
    /// One-based page number (PDF only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Normalized name of the source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Original URL (crawler records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Ordinal of the chunk within its document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    /// `{doc_id}_{chunk_index:04}`, stable and lexically sortable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    /// Estimated token count of `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
    /// Enclosing heading titles, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<String>,
    /// `headings` joined with [`SECTION_SEPARATOR`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_path: Option<String>,
    /// Human-readable title (first heading in a window, or injected later).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Unrecognized keys carried through from upstream records.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Separator used to join heading titles into a `section_path`.
pub const SECTION_SEPARATOR: &str = " > ";

impl ChunkMetadata {
    /// Create metadata for a document.
    #[must_use]
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            ..Self::default()
        }
    }

    /// Set the source file name.
    #[must_use]
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    /// Set the page number.
    #[must_use]
    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Set the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A chunk of document text with provenance, ready to be persisted.
///
/// Serializes to the record shape downstream consumers validate:
///
/// ```json
/// { "source": "docs/setup_guide", "content": "...", "metadata": { "doc_id": "setup_guide", ... } }
/// ```
///
/// Chunks are built once by the [`ChunkAssembler`](crate::ChunkAssembler).
/// Title injection adds to `metadata` and leaves `content` alone; only the
/// explicit clean pass ([`clean_chunks`](crate::clean_chunks)) rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier tying the chunk back to its origin document.
    pub source: String,
    /// The chunk text.
    pub content: String,
    /// Provenance and bookkeeping.
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// The length of the content in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The document this chunk belongs to.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.metadata.doc_id
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ id: {}, source: {}, tokens: {}, len: {} }}",
            self.metadata.chunk_id.as_deref().unwrap_or("-"),
            self.source,
            self.metadata.token_count.unwrap_or(0),
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_required_keys() {
        let chunk = Chunk {
            source: "docs/guide".into(),
            content: "Some content.".into(),
            metadata: ChunkMetadata::new("guide"),
        };
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["source"], "docs/guide");
        assert_eq!(value["content"], "Some content.");
        assert_eq!(value["metadata"]["doc_id"], "guide");
        // Absent optionals stay out of the record
        assert!(value["metadata"].get("page_number").is_none());
        assert!(value["metadata"].get("headings").is_none());
    }

    #[test]
    fn test_unknown_metadata_preserved() {
        let json = r#"{
            "source": "crawl_0",
            "content": "text",
            "metadata": { "doc_id": "crawl", "url": "https://a.b/c", "crawl": { "depth": 2 } }
        }"#;
        let chunk: Chunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.metadata.url.as_deref(), Some("https://a.b/c"));
        assert_eq!(chunk.metadata.extra["crawl"]["depth"], 2);

        let back = serde_json::to_value(&chunk).unwrap();
        assert_eq!(back["metadata"]["crawl"]["depth"], 2);
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let chunk: Chunk = serde_json::from_str(r#"{"source": "s", "content": "c"}"#).unwrap();
        assert_eq!(chunk.doc_id(), "");
    }

    #[test]
    fn test_passage_builders() {
        let p = Passage::new("text", 3)
            .with_headings(vec!["A".into(), "B".into()])
            .with_title(Some("B".into()));
        assert_eq!(p.index, 3);
        assert_eq!(p.headings, ["A", "B"]);
        assert_eq!(p.title.as_deref(), Some("B"));
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_display() {
        let mut metadata = ChunkMetadata::new("doc");
        metadata.chunk_id = Some("doc_0001".into());
        metadata.token_count = Some(2);
        let chunk = Chunk {
            source: "c/doc".into(),
            content: "two words".into(),
            metadata,
        };
        assert_eq!(
            chunk.to_string(),
            "Chunk { id: doc_0001, source: c/doc, tokens: 2, len: 9 }"
        );
    }
}
