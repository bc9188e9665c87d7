//! # ragprep
//!
//! Document preprocessing for retrieval-augmented generation (RAG) pipelines.
//!
//! ## The Problem
//!
//! Retrieval works on chunks, not documents. A good chunk is small enough to
//! embed, large enough to answer a question on its own, and traceable back to
//! where it came from. Getting there from a folder of PDFs, markdown and
//! crawler dumps means:
//!
//! - Cutting at sentence boundaries, never mid-sentence
//! - Repeating a little context across each cut (overlap)
//! - Respecting structure when the document has it (markdown headings)
//! - Attaching provenance: document, page, section path, stable chunk id
//! - Dropping fragments too short to be useful
//!
//! ## Chunking Strategies
//!
//! ### Sentence Windows (prose)
//!
//! Sentences accumulate until the next one would exceed the token target.
//! The window is emitted, and its trailing sentences (up to the overlap
//! budget) seed the next window.
//!
//! ```text
//! target = 250, overlap = 100, sentences of 100 tokens
//!
//! chunk 0: [s1 s2]
//! chunk 1:    [s2 s3]          <- s2 carried over
//! chunk 2:       [s3 s4]
//! ...
//! ```
//!
//! **When to use**: PDF pages, HTML, plain text.
//! **Weakness**: A single sentence longer than the target becomes one
//! oversized chunk.
//!
//! ### Markdown Sections
//!
//! Each heading closes a section. Chunks carry the heading path they were
//! written under (`section_path = "Install > Linux"`). A paragraph-window
//! policy is also available for documents whose headings are unreliable.
//!
//! **When to use**: Documentation, wikis, READMEs.
//! **Weakness**: Sections are not size-bounded unless section splitting is on.
//!
//! ## Quick Start
//!
//! ```rust
//! use ragprep::{Chunker, ChunkAssembler, ChunkMetadata, ChunkTemplate, SentenceWindowChunker};
//!
//! let text = "Retrieval needs chunks that stand on their own. \
//!             Each chunk keeps a pointer back to its document. \
//!             Short fragments are dropped before they reach the index.";
//!
//! let chunker = SentenceWindowChunker::with_tokens(12, 4)?;
//! let passages = chunker.chunk(text);
//!
//! let template = ChunkTemplate::new("docs/intro", ChunkMetadata::new("intro"));
//! let chunks = ChunkAssembler::default().assemble_all(passages, &template);
//!
//! assert_eq!(chunks[0].metadata.chunk_id.as_deref(), Some("intro_0000"));
//! # Ok::<(), ragprep::Error>(())
//! ```
//!
//! ## Batch Ingestion
//!
//! ```rust,no_run
//! use ragprep::{write_chunks, Pipeline, PipelineConfig};
//! use std::path::Path;
//!
//! let pipeline = Pipeline::new(&PipelineConfig::default())?;
//! let report = pipeline.ingest_dir(Path::new("ingestion_source"))?;
//! write_chunks(Path::new("full.json"), &report.chunks)?;
//! # Ok::<(), ragprep::Error>(())
//! ```
//!
//! ## Token Counting
//!
//! Tokens are estimated as whitespace-separated words. Real subword counts run
//! higher (roughly 1.3 tokens per English word), so leave headroom in
//! `target_tokens` when an embedding model has a hard limit.

mod assembler;
mod budget;
mod chunk;
mod clean;
pub mod config;
mod document;
mod epub;
mod error;
mod extract;
mod filter;
mod markdown;
mod output;
mod pipeline;
mod sentence;
mod structure;
mod tokenizer;

pub use assembler::{chunk_id, ChunkAssembler, ChunkTemplate, DEFAULT_MIN_CHARS};
pub use budget::TokenBudget;
pub use chunk::{Chunk, ChunkMetadata, Passage, SECTION_SEPARATOR};
pub use clean::{
    clean_chunk_content, clean_text, collapse_whitespace, html_to_text, strip_html_tags, strip_markdown_images,
    unescape_entities,
};
pub use config::{ChunkingConfig, PipelineConfig};
pub use document::{normalize_doc_id, CrawlRecord, Document, DocumentBody, DocumentKind};
pub use epub::read_epub_sections;
pub use error::{Error, Result};
pub use extract::{extract_path, parse_records, SourceFormat};
pub use filter::{BoilerplateFilter, DEFAULT_PATTERNS};
pub use markdown::{chunk_markdown, MarkdownChunker, MarkdownPolicy};
pub use output::{
    chunk_file_size, clean_chunks, inject_titles, inject_titles_dir, read_chunks, split_by_size, split_group,
    title_from_url, validate_dir, validate_file, write_chunks, write_parts, SplitPart,
    ValidationReport,
};
pub use pipeline::{IngestReport, Pipeline, SkippedFile};
pub use sentence::{chunk_by_sentences, segment_sentences, SentenceWindowChunker};
pub use structure::{
    paragraph_heading, parse_fence, parse_heading, split_paragraphs, Fence, Heading, HeadingPath,
};
pub use tokenizer::estimate_tokens;

/// A text chunking strategy.
///
/// All chunkers implement this trait, enabling polymorphic usage:
///
/// ```rust
/// use ragprep::{Chunker, MarkdownChunker, Passage, SentenceWindowChunker};
///
/// fn chunk_document(chunker: &dyn Chunker, text: &str) -> Vec<Passage> {
///     chunker.chunk(text)
/// }
///
/// let sentences = SentenceWindowChunker::default();
/// let sections = MarkdownChunker::heading_section();
///
/// let text = "# Notes\n\nHello world. This is a test.";
/// let by_sentence = chunk_document(&sentences, text);
/// let by_section = chunk_document(&sections, text);
/// assert_eq!(by_section[0].headings, ["Notes"]);
/// ```
///
/// Chunkers hold only configuration, so one instance can be shared across
/// threads and documents.
pub trait Chunker: Send + Sync {
    /// Split text into passages, in reading order.
    ///
    /// Empty input yields no passages.
    fn chunk(&self, text: &str) -> Vec<Passage>;

    /// Estimate the number of chunks for a given text length.
    ///
    /// Useful for pre-allocation. May be approximate.
    fn estimate_chunks(&self, text_len: usize) -> usize {
        // Conservative default
        (text_len / 500).max(1)
    }
}
