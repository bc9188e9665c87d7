//! Chunk files: writing, reading, and the post-processing passes that run on
//! them (clean, split, validate, title injection).
//!
//! A chunk file is a pretty-printed JSON array of [`Chunk`] records. The only
//! schema downstream consumers rely on is that every element is an object
//! with `source` and `content` keys; [`validate_file`] checks exactly that.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::assembler::ChunkAssembler;
use crate::chunk::Chunk;
use crate::clean::clean_chunk_content;
use crate::error::{Error, Result};
use crate::tokenizer::estimate_tokens;

/// Write chunks to `path` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`Error::Io`] or [`Error::Json`] if the file cannot be written.
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, chunks).map_err(|e| Error::json(path, e))?;
    writer.write_all(b"\n").map_err(|e| Error::io(path, e))?;
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Read a chunk file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, or [`Error::Json`] if it
/// is not an array of chunk records.
pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::json(path, e))
}

/// Re-clean chunk content and re-apply the admission gate.
///
/// Markdown images and HTML tags are removed and whitespace collapsed.
/// Chunks whose cleaned content no longer passes `assembler` are dropped;
/// the rest get an updated `token_count`.
#[must_use]
pub fn clean_chunks(chunks: Vec<Chunk>, assembler: &ChunkAssembler) -> Vec<Chunk> {
    chunks
        .into_iter()
        .filter_map(|mut chunk| {
            let cleaned = clean_chunk_content(&chunk.content);
            if !assembler.admits(&cleaned) {
                return None;
            }
            chunk.metadata.token_count = Some(estimate_tokens(&cleaned));
            chunk.content = cleaned;
            Some(chunk)
        })
        .collect()
}

/// One output file of a size split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPart {
    /// File name, `{group}.json` or `{group}_part{n}.json`.
    pub file_name: String,
    /// Chunks in original order.
    pub chunks: Vec<Chunk>,
}

/// The group a chunk is split into: its URL host (dots as underscores),
/// else its `doc_id`, else `unknown`.
#[must_use]
pub fn split_group(chunk: &Chunk) -> String {
    if let Some(url) = chunk.metadata.url.as_deref().filter(|u| !u.is_empty()) {
        return url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.replace('.', "_")))
            .unwrap_or_else(|| "unknown".to_string());
    }
    if chunk.metadata.doc_id.is_empty() {
        "unknown".to_string()
    } else {
        chunk.metadata.doc_id.clone()
    }
}

/// Bytes of `[]` plus the trailing newline [`write_chunks`] adds.
const FILE_OVERHEAD: usize = 3;

/// Bytes `chunk` adds to a file written by [`write_chunks`].
///
/// Inside the array every line of the chunk's pretty form is indented two
/// more spaces, and each element is preceded by a newline and followed by a
/// comma or the closing newline.
fn element_bytes(chunk: &Chunk) -> usize {
    serde_json::to_vec_pretty(chunk).map_or(0, |b| {
        let lines = b.iter().filter(|&&c| c == b'\n').count() + 1;
        b.len() + 2 * lines + 2
    })
}

/// Exact size in bytes of the file [`write_chunks`] writes for `chunks`.
///
/// ```rust
/// use ragprep::{chunk_file_size, Chunk, ChunkMetadata};
///
/// let chunk = Chunk {
///     source: "c/doc".into(),
///     content: "Some text".into(),
///     metadata: ChunkMetadata::new("doc"),
/// };
/// let pretty = serde_json::to_string_pretty(&[chunk.clone()]).unwrap();
/// assert_eq!(chunk_file_size(&[chunk]), pretty.len() + 1);
/// assert_eq!(chunk_file_size(&[]), "[]\n".len());
/// ```
#[must_use]
pub fn chunk_file_size(chunks: &[Chunk]) -> usize {
    FILE_OVERHEAD + chunks.iter().map(element_bytes).sum::<usize>()
}

/// Group chunks and pack each group into parts whose written file is at
/// most `max_bytes`.
///
/// Sizes are measured as [`write_chunks`] lays the file out, so a part
/// written by [`write_parts`] never exceeds `max_bytes` unless it holds a
/// single chunk that is larger on its own. Groups appear in order of first
/// occurrence.
#[must_use]
pub fn split_by_size(chunks: Vec<Chunk>, max_bytes: usize) -> Vec<SplitPart> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Chunk>> = HashMap::new();
    for chunk in chunks {
        let group = split_group(&chunk);
        if !groups.contains_key(&group) {
            order.push(group.clone());
        }
        groups.entry(group).or_default().push(chunk);
    }

    let mut parts = Vec::new();
    for group in order {
        let Some(members) = groups.remove(&group) else {
            continue;
        };

        let mut current: Vec<Chunk> = Vec::new();
        let mut current_bytes = FILE_OVERHEAD;
        let mut part = 1usize;

        for chunk in members {
            let bytes = element_bytes(&chunk);
            if !current.is_empty() && current_bytes + bytes > max_bytes {
                parts.push(SplitPart {
                    file_name: part_name(&group, part),
                    chunks: std::mem::take(&mut current),
                });
                current_bytes = FILE_OVERHEAD;
                part += 1;
            }
            current.push(chunk);
            current_bytes += bytes;
        }

        if !current.is_empty() {
            parts.push(SplitPart {
                file_name: part_name(&group, part),
                chunks: current,
            });
        }
    }

    parts
}

fn part_name(group: &str, part: usize) -> String {
    if part > 1 {
        format!("{group}_part{part}.json")
    } else {
        format!("{group}.json")
    }
}

/// Write split parts into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns the first write failure.
pub fn write_parts(dir: &Path, parts: &[SplitPart]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    parts
        .iter()
        .map(|part| {
            let path = dir.join(&part.file_name);
            write_chunks(&path, &part.chunks)?;
            Ok(path)
        })
        .collect()
}

/// Check that `path` holds a JSON array of objects with `source` and
/// `content` keys. Returns the number of records.
///
/// # Errors
///
/// Returns [`Error::Json`] for unparseable files and [`Error::Schema`] for
/// the first record that breaks the schema.
pub fn validate_file(path: &Path) -> Result<usize> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let value: serde_json::Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::json(path, e))?;

    let schema = |reason: String| Error::Schema {
        path: path.to_path_buf(),
        reason,
    };

    let entries = value
        .as_array()
        .ok_or_else(|| schema("top-level value is not an array".to_string()))?;

    for (i, entry) in entries.iter().enumerate() {
        let object = entry
            .as_object()
            .ok_or_else(|| schema(format!("entry {i} is not an object")))?;
        if !object.contains_key("source") || !object.contains_key("content") {
            return Err(schema(format!("entry {i} is missing `source` or `content`")));
        }
    }

    Ok(entries.len())
}

/// Outcome of validating a directory of chunk files.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Files that passed, with their record counts.
    pub valid: Vec<(PathBuf, usize)>,
    /// Files that failed, with the reason.
    pub invalid: Vec<(PathBuf, String)>,
    /// Files larger than the size limit, with their size in bytes.
    pub oversized: Vec<(PathBuf, u64)>,
}

impl ValidationReport {
    /// Whether every file passed and none is over the size limit.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.invalid.is_empty() && self.oversized.is_empty()
    }
}

/// Validate every `*.json` file directly inside `dir`, and with `max_bytes`
/// set, flag files larger than that.
///
/// Every file is checked; failures are collected rather than returned early.
/// The size check is independent of the schema check, so a file can be both
/// valid and oversized.
///
/// # Errors
///
/// Returns [`Error::Io`] only if `dir` cannot be listed.
pub fn validate_dir(dir: &Path, max_bytes: Option<u64>) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    for path in json_files(dir)? {
        if let Some(limit) = max_bytes {
            match std::fs::metadata(&path) {
                Ok(meta) if meta.len() > limit => {
                    warn!(file = %path.display(), bytes = meta.len(), limit, "over size limit");
                    report.oversized.push((path.clone(), meta.len()));
                }
                Ok(_) => {}
                Err(e) => {
                    let reason = Error::io(&path, e).to_string();
                    report.invalid.push((path, reason));
                    continue;
                }
            }
        }

        match validate_file(&path) {
            Ok(records) => {
                info!(file = %path.display(), records, "valid");
                report.valid.push((path, records));
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "invalid");
                report.invalid.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Title inferred from a URL: its last path segment, lowercased, with `-`
/// and `_` as spaces.
///
/// ```rust
/// use ragprep::title_from_url;
///
/// assert_eq!(title_from_url("https://docs.example.com/guides/Getting_Started-Fast/"), "getting started fast");
/// ```
#[must_use]
pub fn title_from_url(url: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    segment
        .to_lowercase()
        .replace(['-', '_'], " ")
        .trim()
        .to_string()
}

/// Set `metadata.title` on chunks that have none.
///
/// The title comes from `metadata.url` if present, else the file stem of
/// `source`. Content is never touched. Returns how many chunks changed.
pub fn inject_titles(chunks: &mut [Chunk]) -> usize {
    let mut injected = 0;
    for chunk in chunks.iter_mut().filter(|c| c.metadata.title.is_none()) {
        let title = match chunk.metadata.url.as_deref() {
            Some(url) => title_from_url(url),
            None => Path::new(&chunk.source)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
        };
        chunk.metadata.title = Some(title);
        injected += 1;
    }
    injected
}

/// Inject titles into every `*.json` chunk file directly inside `dir`,
/// rewriting the files in place.
///
/// # Errors
///
/// Returns the first read or write failure.
pub fn inject_titles_dir(dir: &Path) -> Result<usize> {
    let mut injected = 0;
    for path in json_files(dir)? {
        let mut chunks = read_chunks(&path)?;
        injected += inject_titles(&mut chunks);
        write_chunks(&path, &chunks)?;
    }
    Ok(injected)
}

/// `*.json` files directly inside `dir`, sorted.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    Ok(files)
}
