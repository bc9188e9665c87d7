//! Boilerplate filtering.
//!
//! Crawled pages and exported documents repeat the same legal footers, cookie
//! banners and navigation prompts on every page. A chunk that contains one of
//! these phrases is usually *about* nothing else, so whole chunks are dropped
//! rather than edited.

use regex::{RegexSet, RegexSetBuilder};

use crate::chunk::Chunk;
use crate::error::{Error, Result};

/// Phrases that mark a chunk as boilerplate. Matched case-insensitively.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"all rights reserved",
    r"this page was last updated",
    r"copyright \d{4}",
    r"terms of service",
    r"privacy policy",
    r"enable javascript",
    r"cookie consent",
    r"log in to your account",
    r"subscribe to our newsletter",
    r"accept cookies",
];

/// Drops chunks whose content matches any boilerplate pattern.
///
/// ```rust
/// use ragprep::BoilerplateFilter;
///
/// let filter = BoilerplateFilter::default();
/// assert!(filter.is_boilerplate("Copyright 2023 Example Corp. All Rights Reserved."));
/// assert!(!filter.is_boilerplate("Install the package with your system manager."));
/// ```
#[derive(Debug, Clone)]
pub struct BoilerplateFilter {
    patterns: RegexSet,
}

impl BoilerplateFilter {
    /// Compile a case-insensitive filter from `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any pattern is not a valid regex.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Config(format!("invalid boilerplate pattern: {e}")))?;
        Ok(Self { patterns })
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the filter has no patterns (and so keeps everything non-empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `text` matches any pattern.
    #[must_use]
    pub fn is_boilerplate(&self, text: &str) -> bool {
        self.patterns.is_match(text)
    }

    /// Whether a chunk should be kept: non-empty and not boilerplate.
    #[must_use]
    pub fn keeps(&self, chunk: &Chunk) -> bool {
        !chunk.content.trim().is_empty() && !self.is_boilerplate(&chunk.content)
    }

    /// Keep the chunks that pass, in order.
    #[must_use]
    pub fn apply(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        chunks.into_iter().filter(|c| self.keeps(c)).collect()
    }
}

impl Default for BoilerplateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERNS).unwrap_or_else(|_| Self {
            patterns: RegexSet::empty(),
        })
    }
}
