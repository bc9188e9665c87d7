//! Structure-aware markdown chunking.
//!
//! Markdown carries its own segmentation: headings announce topic changes and
//! blank lines separate paragraphs. Two policies use that structure.
//!
//! ## Heading Sections (default)
//!
//! Every heading closes the current section. The buffered text becomes one
//! chunk, labelled with the heading path that was open while it was written:
//!
//! ```text
//! # Install             path [Install]
//! Download the...       ─┐
//!                        ├─ chunk 0, section_path "Install"
//! Unpack it...          ─┘
//! ## Linux              path [Install, Linux]
//! Use the package...    ── chunk 1, section_path "Install > Linux"
//! ```
//!
//! Sections are not bounded by tokens unless section splitting is enabled,
//! in which case an oversized section is re-windowed by sentences and each
//! piece keeps the section's headings.
//!
//! ## Paragraph Windows
//!
//! A fixed window of `window_size` paragraphs slides forward by
//! `max(1, window_size - overlap)` paragraphs per step, for as long as a full
//! window fits. A document with fewer paragraphs than the window becomes one
//! chunk. Each window is titled by its first heading paragraph, if any.
//!
//! ```text
//! window_size = 3, overlap = 1 (step 2)
//!
//! paragraphs  P0 P1 P2 P3 P4 P5 P6
//! chunk 0     [P0 P1 P2]
//! chunk 1           [P2 P3 P4]
//! chunk 2                 [P4 P5 P6]
//! ```
//!
//! Paragraphs past the last full window are not emitted (with step 2 and six
//! paragraphs, P5 is never covered). Use heading sections when full coverage
//! matters.

use crate::assembler::{ChunkAssembler, ChunkTemplate};
use crate::chunk::{Chunk, Passage};
use crate::error::{Error, Result};
use crate::sentence::SentenceWindowChunker;
use crate::structure::{paragraph_heading, parse_fence, parse_heading, split_paragraphs, Fence, HeadingPath};
use crate::tokenizer::estimate_tokens;
use crate::Chunker;

/// How a [`MarkdownChunker`] groups content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownPolicy {
    /// One chunk per heading section.
    HeadingSection,
    /// Sliding windows of whole paragraphs.
    ParagraphWindow {
        /// Paragraphs per window.
        window_size: usize,
        /// Paragraphs shared by consecutive windows.
        overlap: usize,
    },
}

/// Markdown chunker.
///
/// ## Example
///
/// ```rust
/// use ragprep::{Chunker, MarkdownChunker};
///
/// let text = "# A\n\nIntro paragraph.\n\n## B\n\nDetails paragraph.";
/// let passages = MarkdownChunker::heading_section().chunk(text);
///
/// assert_eq!(passages.len(), 2);
/// assert_eq!(passages[0].headings, ["A"]);
/// assert_eq!(passages[1].headings, ["A", "B"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MarkdownChunker {
    policy: MarkdownPolicy,
    section_splitter: Option<SentenceWindowChunker>,
}

impl MarkdownChunker {
    /// Chunk by heading sections.
    #[must_use]
    pub const fn heading_section() -> Self {
        Self {
            policy: MarkdownPolicy::HeadingSection,
            section_splitter: None,
        }
    }

    /// Chunk by sliding paragraph windows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindowSize`] if `window_size == 0`.
    pub fn paragraph_window(window_size: usize, overlap: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::InvalidWindowSize(window_size));
        }
        Ok(Self {
            policy: MarkdownPolicy::ParagraphWindow {
                window_size,
                overlap,
            },
            section_splitter: None,
        })
    }

    /// Build a chunker for `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindowSize`] for a zero-sized paragraph window.
    pub fn from_policy(policy: MarkdownPolicy) -> Result<Self> {
        match policy {
            MarkdownPolicy::HeadingSection => Ok(Self::heading_section()),
            MarkdownPolicy::ParagraphWindow {
                window_size,
                overlap,
            } => Self::paragraph_window(window_size, overlap),
        }
    }

    /// Re-window heading sections longer than the splitter's target.
    ///
    /// Has no effect on the paragraph-window policy.
    #[must_use]
    pub const fn with_section_splitting(mut self, splitter: SentenceWindowChunker) -> Self {
        self.section_splitter = Some(splitter);
        self
    }

    /// The grouping policy.
    #[must_use]
    pub const fn policy(&self) -> MarkdownPolicy {
        self.policy
    }

    fn chunk_sections(&self, text: &str) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut path = HeadingPath::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut fence: Option<Fence> = None;

        for line in text.lines() {
            match fence {
                Some(open) => {
                    if open.is_closed_by(line) {
                        fence = None;
                    }
                }
                None => {
                    if let Some(opened) = parse_fence(line) {
                        fence = Some(opened);
                    } else if let Some(heading) = parse_heading(line) {
                        self.flush_section(&mut buffer, &path, &mut passages);
                        path.enter(heading);
                        continue;
                    }
                }
            }
            buffer.push(line);
        }
        self.flush_section(&mut buffer, &path, &mut passages);

        passages
    }

    fn flush_section(&self, buffer: &mut Vec<&str>, path: &HeadingPath, passages: &mut Vec<Passage>) {
        let joined = buffer.join("\n");
        buffer.clear();

        let body = joined.trim();
        if body.is_empty() {
            return;
        }

        let headings = path.titles();
        let title = path.current().map(|h| h.text.clone());

        match self.section_splitter {
            Some(splitter) if estimate_tokens(body) > splitter.budget().target() => {
                for piece in splitter.chunk(body) {
                    passages.push(
                        Passage::new(piece.text, passages.len())
                            .with_headings(headings.clone())
                            .with_title(title.clone()),
                    );
                }
            }
            _ => passages.push(
                Passage::new(body, passages.len())
                    .with_headings(headings)
                    .with_title(title),
            ),
        }
    }

    fn chunk_windows(text: &str, window_size: usize, overlap: usize) -> Vec<Passage> {
        let paragraphs = split_paragraphs(text);
        if paragraphs.is_empty() {
            return vec![];
        }

        // Heading path as of the end of each paragraph
        let mut path = HeadingPath::new();
        let paths: Vec<Vec<String>> = paragraphs
            .iter()
            .map(|p| {
                if let Some(heading) = paragraph_heading(p) {
                    path.enter(heading);
                }
                path.titles()
            })
            .collect();

        if paragraphs.len() < window_size {
            return vec![window_passage(&paragraphs, &paths[paragraphs.len() - 1], 0)];
        }

        let step = window_size.saturating_sub(overlap).max(1);
        (0..=paragraphs.len() - window_size)
            .step_by(step)
            .enumerate()
            .map(|(index, start)| {
                let end = start + window_size;
                window_passage(&paragraphs[start..end], &paths[end - 1], index)
            })
            .collect()
    }
}

fn window_passage(paragraphs: &[&str], headings: &[String], index: usize) -> Passage {
    let title = paragraphs
        .iter()
        .find_map(|p| paragraph_heading(p))
        .map(|h| h.text);

    Passage::new(paragraphs.join("\n\n"), index)
        .with_headings(headings.to_vec())
        .with_title(title)
}

impl Default for MarkdownChunker {
    fn default() -> Self {
        Self::heading_section()
    }
}

impl Chunker for MarkdownChunker {
    fn chunk(&self, text: &str) -> Vec<Passage> {
        if text.trim().is_empty() {
            return vec![];
        }
        match self.policy {
            MarkdownPolicy::HeadingSection => self.chunk_sections(text),
            MarkdownPolicy::ParagraphWindow {
                window_size,
                overlap,
            } => Self::chunk_windows(text, window_size, overlap),
        }
    }
}

/// Chunk markdown by paragraph windows and assemble the result.
///
/// Convenience wrapper combining a paragraph-window [`MarkdownChunker`] with a
/// default [`ChunkAssembler`].
///
/// # Errors
///
/// Returns [`Error::InvalidWindowSize`] if `window_size == 0`.
pub fn chunk_markdown(
    text: &str,
    window_size: usize,
    overlap: usize,
    template: &ChunkTemplate,
) -> Result<Vec<Chunk>> {
    let chunker = MarkdownChunker::paragraph_window(window_size, overlap)?;
    Ok(ChunkAssembler::default().assemble_all(chunker.chunk(text), template))
}
