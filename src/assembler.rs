//! Chunk assembly: passages in, persisted chunks out.
//!
//! The assembler is the last step every passage goes through, whichever
//! chunker produced it. It:
//!
//! 1. drops passages whose trimmed text is shorter than `min_chars`
//! 2. copies the document's metadata template
//! 3. adds `token_count`, `chunk_index` and `chunk_id = {doc_id}_{index:04}`
//! 4. adds `headings`, `section_path` and `title` from the passage's structure
//!
//! Ordinals count admitted chunks only, so a document's chunk ids are always
//! `_0000, _0001, ...` with no gaps left by dropped passages.

use crate::chunk::{Chunk, ChunkMetadata, Passage, SECTION_SEPARATOR};
use crate::tokenizer::estimate_tokens;

/// Default minimum trimmed character length for a chunk to be kept.
pub const DEFAULT_MIN_CHARS: usize = 40;

/// Per-document values copied into every chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkTemplate {
    /// The chunk `source` (e.g. `{collection}/{doc_id}`).
    pub source: String,
    /// Metadata shared by all chunks of the document.
    pub metadata: ChunkMetadata,
}

impl ChunkTemplate {
    /// Create a template.
    #[must_use]
    pub fn new(source: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            source: source.into(),
            metadata,
        }
    }

    /// The document id chunk ids are derived from.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.metadata.doc_id
    }
}

/// Turns passages into chunks, enforcing the minimum-length admission gate.
///
/// ## Example
///
/// ```rust
/// use ragprep::{ChunkAssembler, ChunkMetadata, ChunkTemplate};
///
/// let template = ChunkTemplate::new("docs/guide", ChunkMetadata::new("guide"));
/// let assembler = ChunkAssembler::new(10);
///
/// let chunk = assembler.assemble("Long enough to keep.", &template, 7).unwrap();
/// assert_eq!(chunk.metadata.chunk_id.as_deref(), Some("guide_0007"));
/// assert_eq!(chunk.metadata.token_count, Some(4));
///
/// assert!(assembler.assemble("too short", &template, 8).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkAssembler {
    min_chars: usize,
}

impl ChunkAssembler {
    /// Create an assembler with a minimum trimmed character length.
    ///
    /// `0` admits every non-empty chunk.
    #[must_use]
    pub const fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// The admission threshold in characters.
    #[must_use]
    pub const fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Whether `text` passes the admission gate.
    #[must_use]
    pub fn admits(&self, text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && trimmed.chars().count() >= self.min_chars
    }

    /// Assemble raw chunk text into a chunk with ordinal `ordinal`.
    ///
    /// Returns `None` if the text fails the admission gate.
    pub fn assemble(&self, text: &str, template: &ChunkTemplate, ordinal: usize) -> Option<Chunk> {
        if !self.admits(text) {
            return None;
        }

        let content = text.trim().to_string();
        let mut metadata = template.metadata.clone();
        metadata.token_count = Some(estimate_tokens(&content));
        metadata.chunk_index = Some(ordinal);
        metadata.chunk_id = Some(chunk_id(template.doc_id(), ordinal));

        Some(Chunk {
            source: template.source.clone(),
            content,
            metadata,
        })
    }

    /// Assemble a passage, carrying over its headings and title.
    pub fn assemble_passage(
        &self,
        passage: Passage,
        template: &ChunkTemplate,
        ordinal: usize,
    ) -> Option<Chunk> {
        let mut chunk = self.assemble(&passage.text, template, ordinal)?;

        if !passage.headings.is_empty() {
            chunk.metadata.section_path = Some(passage.headings.join(SECTION_SEPARATOR));
            chunk.metadata.headings = passage.headings;
        }
        if passage.title.is_some() {
            chunk.metadata.title = passage.title;
        }

        Some(chunk)
    }

    /// Assemble a document's passages in order, numbering admitted chunks
    /// from zero.
    pub fn assemble_all<I>(&self, passages: I, template: &ChunkTemplate) -> Vec<Chunk>
    where
        I: IntoIterator<Item = Passage>,
    {
        let mut chunks = Vec::new();
        self.assemble_into(passages, template, &mut chunks);
        chunks
    }

    /// Assemble passages onto the end of `chunks`, continuing its numbering.
    ///
    /// `chunks` must hold only the current document's chunks. Used for
    /// documents chunked in parts (one PDF page at a time) so ordinals stay
    /// contiguous across parts.
    pub fn assemble_into<I>(&self, passages: I, template: &ChunkTemplate, chunks: &mut Vec<Chunk>)
    where
        I: IntoIterator<Item = Passage>,
    {
        for passage in passages {
            if let Some(chunk) = self.assemble_passage(passage, template, chunks.len()) {
                chunks.push(chunk);
            }
        }
    }
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARS)
    }
}

/// `{doc_id}_{ordinal:04}`.
#[must_use]
pub fn chunk_id(doc_id: &str, ordinal: usize) -> String {
    format!("{doc_id}_{ordinal:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ChunkTemplate {
        ChunkTemplate::new(
            "library/manual",
            ChunkMetadata::new("manual")
                .with_source_file("manual")
                .with_page(3),
        )
    }

    const LONG: &str = "This sentence is comfortably longer than forty characters.";

    #[test]
    fn test_assemble_copies_template() {
        let chunk = ChunkAssembler::default()
            .assemble(LONG, &template(), 0)
            .unwrap();
        assert_eq!(chunk.source, "library/manual");
        assert_eq!(chunk.metadata.doc_id, "manual");
        assert_eq!(chunk.metadata.page_number, Some(3));
        assert_eq!(chunk.metadata.source_file.as_deref(), Some("manual"));
        assert_eq!(chunk.metadata.chunk_index, Some(0));
        assert_eq!(chunk.metadata.chunk_id.as_deref(), Some("manual_0000"));
        assert_eq!(chunk.metadata.token_count, Some(8));
    }

    #[test]
    fn test_admission_threshold() {
        let assembler = ChunkAssembler::default();
        let exactly_40 = "a".repeat(40);
        let just_under = format!("   {}   ", "a".repeat(39));

        assert!(assembler.admits(&exactly_40));
        assert!(!assembler.admits(&just_under));
        assert!(!assembler.admits(""));
    }

    #[test]
    fn test_threshold_counts_chars_not_bytes() {
        let assembler = ChunkAssembler::new(5);
        // 6 chars, 18 bytes
        assert!(assembler.admits("日本語です。"));
    }

    #[test]
    fn test_zero_threshold_still_rejects_blank() {
        let assembler = ChunkAssembler::new(0);
        assert!(assembler.admits("x"));
        assert!(!assembler.admits("   "));
    }

    #[test]
    fn test_content_trimmed() {
        let chunk = ChunkAssembler::new(1)
            .assemble("  padded  ", &template(), 0)
            .unwrap();
        assert_eq!(chunk.content, "padded");
    }

    #[test]
    fn test_assemble_passage_structure() {
        let passage = Passage::new(LONG, 0)
            .with_headings(vec!["Guide".into(), "Install".into()])
            .with_title(Some("Install".into()));
        let chunk = ChunkAssembler::default()
            .assemble_passage(passage, &template(), 0)
            .unwrap();
        assert_eq!(chunk.metadata.headings, ["Guide", "Install"]);
        assert_eq!(chunk.metadata.section_path.as_deref(), Some("Guide > Install"));
        assert_eq!(chunk.metadata.title.as_deref(), Some("Install"));
    }

    #[test]
    fn test_assemble_all_ordinals_skip_rejected() {
        let passages = vec![
            Passage::new(LONG, 0),
            Passage::new("short", 1),
            Passage::new(LONG, 2),
        ];
        let chunks = ChunkAssembler::default().assemble_all(passages, &template());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.chunk_id.as_deref(), Some("manual_0000"));
        assert_eq!(chunks[1].metadata.chunk_id.as_deref(), Some("manual_0001"));
    }

    #[test]
    fn test_assemble_into_continues_numbering() {
        let assembler = ChunkAssembler::default();
        let page_one = template();
        let mut page_two = template();
        page_two.metadata.page_number = Some(4);

        let mut chunks = Vec::new();
        assembler.assemble_into(vec![Passage::new(LONG, 0)], &page_one, &mut chunks);
        assembler.assemble_into(vec![Passage::new(LONG, 0)], &page_two, &mut chunks);

        assert_eq!(chunks[1].metadata.chunk_id.as_deref(), Some("manual_0001"));
        assert_eq!(chunks[1].metadata.page_number, Some(4));
    }

    #[test]
    fn test_chunk_id_padding() {
        assert_eq!(chunk_id("doc", 7), "doc_0007");
        assert_eq!(chunk_id("doc", 12345), "doc_12345");
    }
}
