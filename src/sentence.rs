//! Sentence segmentation and token-bounded sentence windows.
//!
//! ## The Hard Part: Finding Sentences
//!
//! Sentence detection seems simple until you encounter:
//!
//! ```text
//! "Pi is roughly 3.14, e.g. in school. It is irrational."
//!                 ^     ^ ^          ^
//! ```
//!
//! Only the last marked period ends a sentence.
//!
//! We use Unicode Standard Annex #29 (UAX #29) for sentence segmentation:
//! a terminator (`.`, `!`, `?`) followed by whitespace and an uppercase letter
//! is a boundary, a terminator followed by lowercase is not. This handles
//! decimals (3.14159), ellipses and abbreviations followed by lowercase
//! ("e.g. this"). Title abbreviations before a capital ("Dr. Smith") still
//! split; that matches the punctuation-plus-capital rule and is accepted.
//!
//! ## Sentence Windows
//!
//! Sentences are the atomic unit: a window fills with whole sentences until
//! the next one would push it past `target` tokens, then it is emitted and the
//! next window is seeded with the emitted window's trailing sentences, up to
//! `overlap` tokens:
//!
//! ```text
//! target = 250, overlap = 100, every sentence 100 tokens
//!
//! [s1 s2]     + s3 -> 300 > 250 -> emit [s1 s2], tail [s2]
//! [s2 s3]     + s4 -> 300 > 250 -> emit [s2 s3], tail [s3]
//! ...
//! [s11 s12]   end of input      -> emit [s11 s12]
//! ```
//!
//! A sentence longer than `target` on its own is still emitted whole. Splitting
//! inside a sentence would produce fragments that embed poorly; the cost is
//! an occasional oversize chunk.

use unicode_segmentation::UnicodeSegmentation;

use crate::assembler::{ChunkAssembler, ChunkTemplate};
use crate::budget::TokenBudget;
use crate::chunk::{Chunk, Passage};
use crate::error::Result;
use crate::tokenizer::{estimate_tokens, total_tokens};
use crate::Chunker;

/// Split prose into sentences.
///
/// Whitespace runs (including line breaks) are collapsed to single spaces
/// before segmentation; no other characters are removed, so joining the
/// output with single spaces reproduces the input modulo whitespace.
///
/// ```rust
/// use ragprep::segment_sentences;
///
/// let sentences = segment_sentences("Hello world. How are you?  I am\nfine.");
/// assert_eq!(sentences, ["Hello world.", "How are you?", "I am fine."]);
/// assert!(segment_sentences("").is_empty());
/// ```
#[must_use]
pub fn segment_sentences(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![];
    }

    // UAX #29 breaks after every line feed; wrapped lines are not sentences.
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");

    normalized
        .split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Sentence-window chunker.
///
/// Groups consecutive sentences into chunks of up to `target` tokens, with
/// trailing sentences repeated at the start of the next chunk for context.
///
/// ## Example
///
/// ```rust
/// use ragprep::{Chunker, SentenceWindowChunker, TokenBudget};
///
/// let chunker = SentenceWindowChunker::new(TokenBudget::new(6, 3).unwrap());
/// let passages = chunker.chunk("One two three. Four five six. Seven eight nine.");
///
/// assert_eq!(passages.len(), 2);
/// assert_eq!(passages[0].text, "One two three. Four five six.");
/// // The second chunk starts with the last sentence of the first
/// assert_eq!(passages[1].text, "Four five six. Seven eight nine.");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceWindowChunker {
    budget: TokenBudget,
}

impl SentenceWindowChunker {
    /// Create a chunker from a validated budget.
    #[must_use]
    pub const fn new(budget: TokenBudget) -> Self {
        Self { budget }
    }

    /// Create a chunker from raw token counts.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target_tokens == 0` or
    /// `overlap_tokens >= target_tokens`.
    pub fn with_tokens(target_tokens: usize, overlap_tokens: usize) -> Result<Self> {
        Ok(Self::new(TokenBudget::new(target_tokens, overlap_tokens)?))
    }

    /// The budget this chunker windows by.
    #[must_use]
    pub const fn budget(&self) -> TokenBudget {
        self.budget
    }

    /// Window an already-segmented sentence sequence.
    ///
    /// Blank entries are skipped. Passages are joined with single spaces.
    pub fn chunk_sentences<S: AsRef<str>>(&self, sentences: &[S]) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut window_tokens = 0usize;

        for sentence in sentences {
            let sentence = sentence.as_ref().trim();
            if sentence.is_empty() {
                continue;
            }
            let tokens = estimate_tokens(sentence);

            if !window.is_empty() && self.budget.would_overflow(window_tokens, tokens) {
                passages.push(Passage::new(window.join(" "), passages.len()));

                let tail_start = overlap_start(&window, self.budget.overlap());
                window.drain(..tail_start);
                window_tokens = total_tokens(&window);
            }

            window.push(sentence);
            window_tokens += tokens;
        }

        if !window.is_empty() {
            passages.push(Passage::new(window.join(" "), passages.len()));
        }

        passages
    }
}

/// Index where the overlap tail of `window` begins.
///
/// Walks backward from the end, taking whole sentences while their cumulative
/// token count stays within `overlap`. Returns `window.len()` when not even the
/// last sentence fits.
fn overlap_start(window: &[&str], overlap: usize) -> usize {
    let mut start = window.len();
    let mut carried = 0usize;

    while start > 0 {
        let tokens = estimate_tokens(window[start - 1]);
        if carried + tokens > overlap {
            break;
        }
        carried += tokens;
        start -= 1;
    }

    start
}

impl Chunker for SentenceWindowChunker {
    fn chunk(&self, text: &str) -> Vec<Passage> {
        if text.is_empty() {
            return vec![];
        }
        self.chunk_sentences(&segment_sentences(text))
    }

    fn estimate_chunks(&self, text_len: usize) -> usize {
        // Rough estimate: ~6 bytes per word
        let step = (self.budget.target() - self.budget.overlap()).max(1);
        (text_len / 6 / step).max(1)
    }
}

/// Window `sentences` and assemble the result into chunks.
///
/// Convenience wrapper combining [`SentenceWindowChunker`] with a default
/// [`ChunkAssembler`]: every admitted chunk gets a copy of the template's
/// metadata plus `chunk_index`, `chunk_id` and `token_count`.
///
/// # Errors
///
/// Returns a configuration error if `target_tokens == 0` or
/// `overlap_tokens >= target_tokens`.
pub fn chunk_by_sentences<S: AsRef<str>>(
    sentences: &[S],
    target_tokens: usize,
    overlap_tokens: usize,
    template: &ChunkTemplate,
) -> Result<Vec<Chunk>> {
    let chunker = SentenceWindowChunker::with_tokens(target_tokens, overlap_tokens)?;
    let passages = chunker.chunk_sentences(sentences);
    Ok(ChunkAssembler::default().assemble_all(passages, template))
}
