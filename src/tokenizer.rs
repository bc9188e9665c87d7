//! Token estimation.
//!
//! Chunk budgets are expressed in tokens, but exact BPE counts would tie the
//! pipeline to one model's vocabulary. Whitespace-delimited words are a cheap,
//! deterministic proxy. English prose runs at roughly 1.3 subword tokens per
//! word, so estimates run low against a real tokenizer.
//!
//! ```text
//! "The quick  brown\tfox"  ->  4
//! "   \n  "                 ->  0
//! ```

/// Estimate the token count of `text` as its number of whitespace-delimited words.
///
/// Empty and whitespace-only input returns 0.
///
/// ```rust
/// use ragprep::estimate_tokens;
///
/// assert_eq!(estimate_tokens("Pack my box with five dozen liquor jugs."), 8);
/// assert_eq!(estimate_tokens(""), 0);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sum of [`estimate_tokens`] over a sequence of text units.
pub(crate) fn total_tokens<S: AsRef<str>>(units: &[S]) -> usize {
    units.iter().map(|u| estimate_tokens(u.as_ref())).sum()
}
