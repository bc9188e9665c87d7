//! Batch ingestion: route documents to chunkers and collect their chunks.
//!
//! ```text
//! Document ─┬─ Prose ────> clean_text ─> SentenceWindowChunker ─┐
//!           ├─ Pages ────> (per page, same as prose) ───────────┼─> ChunkAssembler ─> BoilerplateFilter
//!           ├─ Markdown ─> MarkdownChunker ─────────────────────┘
//!           └─ Records ──> clean_text ─> one chunk per record ──> ChunkAssembler ─> BoilerplateFilter
//! ```
//!
//! Documents are independent, so [`Pipeline::ingest_dir`] processes files in
//! parallel and concatenates results in file order. A file that fails to
//! extract is logged and skipped; only configuration errors stop a run.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::assembler::{ChunkAssembler, ChunkTemplate};
use crate::chunk::{Chunk, ChunkMetadata};
use crate::clean::clean_text;
use crate::config::PipelineConfig;
use crate::document::{CrawlRecord, Document, DocumentBody, DocumentKind};
use crate::error::{Error, Result};
use crate::extract::{extract_path, SourceFormat};
use crate::filter::BoilerplateFilter;
use crate::markdown::MarkdownChunker;
use crate::sentence::SentenceWindowChunker;
use crate::Chunker;

/// A file that was not ingested, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// The file.
    pub path: PathBuf,
    /// The extraction error, rendered.
    pub reason: String,
}

/// Result of ingesting a directory.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// All chunks, grouped by document in file order.
    pub chunks: Vec<Chunk>,
    /// Documents that were extracted (including those yielding no chunks).
    pub documents: usize,
    /// Documents that produced no chunks.
    pub empty_documents: usize,
    /// Files that failed extraction.
    pub skipped: Vec<SkippedFile>,
}

/// The configured chunking pipeline.
///
/// Built once from a validated configuration, then shared across threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    sentences: SentenceWindowChunker,
    markdown: MarkdownChunker,
    assembler: ChunkAssembler,
    filter: Option<BoilerplateFilter>,
}

impl Pipeline {
    /// Build a pipeline, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid token budget, paragraph
    /// window or filter pattern.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let filter = if config.filter.enabled {
            Some(config.filter.build()?)
        } else {
            None
        };

        Ok(Self {
            sentences: config.chunking.sentence_chunker()?,
            markdown: config.chunking.markdown_chunker()?,
            assembler: config.chunking.assembler(),
            filter,
        })
    }

    /// Replace the boilerplate filter (`None` disables filtering).
    #[must_use]
    pub fn with_filter(mut self, filter: Option<BoilerplateFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Chunk one document.
    ///
    /// Never fails: empty or missing text yields no chunks.
    pub fn process_document(&self, doc: &Document) -> Vec<Chunk> {
        let metadata = ChunkMetadata::new(&doc.doc_id).with_source_file(&doc.doc_id);
        let mut chunks = Vec::new();

        match &doc.body {
            DocumentBody::Text(text) => {
                let template = ChunkTemplate::new(&doc.source, metadata);
                let passages = match doc.kind {
                    DocumentKind::Markdown => self.markdown.chunk(text),
                    DocumentKind::Prose => self.sentences.chunk(&clean_text(text)),
                };
                self.assembler.assemble_into(passages, &template, &mut chunks);
            }
            DocumentBody::Pages(pages) => {
                for (page_number, text) in pages {
                    let template =
                        ChunkTemplate::new(&doc.source, metadata.clone().with_page(*page_number));
                    let passages = self.sentences.chunk(&clean_text(text));
                    self.assembler.assemble_into(passages, &template, &mut chunks);
                }
            }
            DocumentBody::Records(records) => {
                for (i, record) in records.iter().enumerate() {
                    let template = record_template(&doc.doc_id, i, record);
                    let content = clean_text(record.body());
                    if let Some(chunk) = self.assembler.assemble(&content, &template, chunks.len()) {
                        chunks.push(chunk);
                    }
                }
            }
        }

        let produced = chunks.len();
        if let Some(filter) = &self.filter {
            chunks = filter.apply(chunks);
        }

        debug!(
            doc_id = %doc.doc_id,
            chunks = chunks.len(),
            filtered = produced - chunks.len(),
            "chunked document"
        );
        chunks
    }

    /// Chunk text that may be absent, as a prose document.
    ///
    /// `None` is treated as empty text.
    pub fn process_text(&self, doc_id: &str, source: &str, text: Option<&str>) -> Vec<Chunk> {
        let doc = Document::prose(doc_id, source, text.unwrap_or_default());
        self.process_document(&doc)
    }

    /// Extract and chunk every recognized file under `dir`.
    ///
    /// Chunks are sourced as `{collection}/{doc_id}`, where the collection is
    /// the directory's own name. Files with unrecognized extensions are
    /// ignored. Files that fail extraction, and entries below `dir` that
    /// cannot be read (permissions, dangling symlinks, symlink loops), are
    /// reported in [`IngestReport::skipped`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `dir` itself cannot be read.
    pub fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let collection = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documents".to_string());

        let (files, unreadable) = list_inputs(dir)?;
        info!(dir = %dir.display(), files = files.len(), "ingesting");

        let results: Vec<(PathBuf, Result<Vec<Chunk>>)> = files
            .into_par_iter()
            .map(|path| {
                let result = extract_path(&path, &collection).map(|doc| self.process_document(&doc));
                (path, result)
            })
            .collect();

        let mut report = IngestReport {
            skipped: unreadable,
            ..IngestReport::default()
        };
        for (path, result) in results {
            match result {
                Ok(chunks) => {
                    report.documents += 1;
                    if chunks.is_empty() {
                        report.empty_documents += 1;
                    }
                    report.chunks.extend(chunks);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping document");
                    report.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            documents = report.documents,
            chunks = report.chunks.len(),
            skipped = report.skipped.len(),
            "ingest complete"
        );
        Ok(report)
    }
}

/// Recognized files under `dir` sorted by path, and the entries below it
/// that could not be read.
///
/// Symlinks are followed. Only a failure to read `dir` itself is an error.
fn list_inputs(dir: &Path) -> Result<(Vec<PathBuf>, Vec<SkippedFile>)> {
    let mut files = Vec::new();
    let mut unreadable = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                unreadable.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(Error::io(dir, e.into())),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if SourceFormat::from_path(&path).is_some() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "ignoring unrecognized file");
        }
    }
    Ok((files, unreadable))
}

/// Template for crawler record `i`: sourced `{doc_id}_{i}`, upstream metadata
/// preserved.
fn record_template(doc_id: &str, i: usize, record: &CrawlRecord) -> ChunkTemplate {
    let mut fields = record.metadata.clone();
    fields.insert("doc_id".to_string(), doc_id.into());
    if let Some(url) = record.url.as_deref().filter(|u| !u.is_empty()) {
        fields.insert("url".to_string(), url.into());
    }
    // Bookkeeping keys are assigned by the assembler
    for key in ["chunk_index", "chunk_id", "token_count"] {
        fields.remove(key);
    }

    let metadata = serde_json::from_value(serde_json::Value::Object(fields)).unwrap_or_else(|e| {
        debug!(doc_id, record = i, error = %e, "record metadata not usable, keeping url only");
        let metadata = ChunkMetadata::new(doc_id);
        match record.url.as_deref() {
            Some(url) if !url.is_empty() => metadata.with_url(url),
            _ => metadata,
        }
    });

    ChunkTemplate::new(format!("{doc_id}_{i}"), metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkdownPolicyKind;

    const SENTENCE: &str = "This sentence has exactly eight whitespace separated words.";

    fn pipeline() -> Pipeline {
        let mut config = PipelineConfig::default();
        config.chunking.target_tokens = 20;
        config.chunking.overlap_tokens = 8;
        Pipeline::new(&config).unwrap()
    }

    #[test]
    fn test_prose_document() {
        let text = vec![SENTENCE; 6].join("\n");
        let chunks = pipeline().process_document(&Document::prose("doc", "col/doc", text));

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.source, "col/doc");
            assert_eq!(chunk.metadata.chunk_index, Some(i));
            assert_eq!(chunk.metadata.source_file.as_deref(), Some("doc"));
            assert!(chunk.metadata.token_count.unwrap() <= 20);
        }
    }

    #[test]
    fn test_pages_keep_page_numbers_and_contiguous_ids() {
        let pages = vec![(1, SENTENCE.to_string()), (2, String::new()), (3, SENTENCE.to_string())];
        let chunks = pipeline().process_document(&Document::paged("book", "lib/book", pages));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.page_number, Some(1));
        assert_eq!(chunks[1].metadata.page_number, Some(3));
        assert_eq!(chunks[1].metadata.chunk_id.as_deref(), Some("book_0001"));
    }

    #[test]
    fn test_markdown_document() {
        let text = format!("# A\n\n{SENTENCE}\n\n## B\n\n{SENTENCE}");
        let chunks = pipeline().process_document(&Document::markdown("md", "col/md", text));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].metadata.section_path.as_deref(), Some("A > B"));
    }

    #[test]
    fn test_records_one_chunk_each() {
        let records = vec![
            CrawlRecord {
                text: Some(format!("{SENTENCE} &amp; more")),
                url: Some("https://docs.example.com/setup/install".into()),
                metadata: serde_json::json!({"title": "Install", "depth": 2})
                    .as_object()
                    .cloned()
                    .unwrap(),
                ..CrawlRecord::default()
            },
            CrawlRecord::default(),
            CrawlRecord {
                content: Some(SENTENCE.into()),
                ..CrawlRecord::default()
            },
        ];
        let chunks = pipeline().process_document(&Document::records("crawl", "site/crawl", records));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source, "crawl_0");
        assert!(chunks[0].content.ends_with("& more"));
        assert_eq!(chunks[0].metadata.url.as_deref(), Some("https://docs.example.com/setup/install"));
        assert_eq!(chunks[0].metadata.title.as_deref(), Some("Install"));
        assert_eq!(chunks[0].metadata.extra["depth"], 2);
        assert_eq!(chunks[1].source, "crawl_2");
        assert_eq!(chunks[1].metadata.chunk_id.as_deref(), Some("crawl_0001"));
    }

    #[test]
    fn test_record_with_bad_metadata_types() {
        let record = CrawlRecord {
            text: Some(SENTENCE.into()),
            url: Some("https://a.example/x".into()),
            metadata: serde_json::json!({"page_number": "seven"})
                .as_object()
                .cloned()
                .unwrap(),
            ..CrawlRecord::default()
        };
        let template = record_template("crawl", 0, &record);
        assert_eq!(template.metadata.doc_id, "crawl");
        assert_eq!(template.metadata.url.as_deref(), Some("https://a.example/x"));
        assert!(template.metadata.page_number.is_none());
    }

    #[test]
    fn test_boilerplate_filtered() {
        let text = "Copyright 2024 Example Corp. All rights reserved worldwide, forever and ever.";
        assert!(pipeline().process_text("legal", "c/legal", Some(text)).is_empty());

        let unfiltered = pipeline().with_filter(None);
        assert_eq!(unfiltered.process_text("legal", "c/legal", Some(text)).len(), 1);
    }

    #[test]
    fn test_missing_text_yields_nothing() {
        assert!(pipeline().process_text("d", "c/d", None).is_empty());
        assert!(pipeline().process_text("d", "c/d", Some("")).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entries_do_not_abort_walk() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("corpus");
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(root.join("a.txt"), format!("{SENTENCE} {SENTENCE}")).unwrap();
        std::fs::write(root.join("nested/b.txt"), format!("{SENTENCE} {SENTENCE}")).unwrap();
        symlink(root.join("gone.txt"), root.join("dangling.txt")).unwrap();
        symlink(&root, root.join("nested/loop")).unwrap();

        let report = pipeline().ingest_dir(&root).unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().any(|s| s.path.ends_with("dangling.txt")));
        assert!(report.skipped.iter().any(|s| s.path.ends_with("nested/loop")));
        assert!(report.chunks.iter().all(|c| c.source.starts_with("corpus/")));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.chunking.overlap_tokens = config.chunking.target_tokens;
        assert!(Pipeline::new(&config).unwrap_err().is_configuration());

        let mut config = PipelineConfig::default();
        config.chunking.markdown.policy = MarkdownPolicyKind::ParagraphWindow;
        config.chunking.markdown.window_size = 0;
        assert!(Pipeline::new(&config).is_err());
    }
}
