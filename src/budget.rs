//! Token budget configuration.
//!
//! ## The Problem
//!
//! A sentence window is described by two numbers:
//!
//! - `target`: how many tokens a chunk should hold before it is emitted
//! - `overlap`: how many trailing tokens of a chunk are repeated at the start
//!   of the next one
//!
//! Not every pair is meaningful. If `overlap >= target`, the tail carried into
//! the next window can be the whole previous chunk:
//!
//! ```text
//! target = 100, overlap = 100, sentences of 50 tokens
//!
//! window [s1 s2]     -> s3 overflows -> emit [s1 s2], tail = [s1 s2]
//! window [s1 s2 s3]  -> s4 overflows -> emit [s1 s2 s3], tail = ...
//! ```
//!
//! Each chunk repeats its predecessor and the window start stalls, so the
//! output degenerates into ever-growing prefixes of the document.
//!
//! ## The Solution: Validate Once
//!
//! `TokenBudget` can only be built from a valid pair (`target > 0`,
//! `overlap < target`). Chunkers take a `TokenBudget`, so they never see an
//! invalid configuration and never have to fail mid-document.

use crate::error::{Error, Result};

/// A validated `(target, overlap)` token pair for windowed chunking.
///
/// # Examples
///
/// ```rust
/// use ragprep::TokenBudget;
///
/// let budget = TokenBudget::new(1000, 200).unwrap();
/// assert_eq!(budget.target(), 1000);
/// assert_eq!(budget.overlap(), 200);
///
/// // Overlap must stay below the target
/// assert!(TokenBudget::new(100, 100).is_err());
///
/// // ...unless you ask for it to be clamped
/// let budget = TokenBudget::clamped(100, 150).unwrap();
/// assert_eq!(budget.overlap(), 99);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    target: usize,
    overlap: usize,
}

impl TokenBudget {
    /// Create a budget, rejecting invalid pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTargetTokens`] if `target == 0` and
    /// [`Error::OverlapExceedsTarget`] if `overlap >= target`.
    pub fn new(target: usize, overlap: usize) -> Result<Self> {
        if target == 0 {
            return Err(Error::InvalidTargetTokens(target));
        }
        if overlap >= target {
            return Err(Error::OverlapExceedsTarget { target, overlap });
        }
        Ok(Self { target, overlap })
    }

    /// Create a budget, clamping `overlap` to `target - 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTargetTokens`] if `target == 0`.
    pub fn clamped(target: usize, overlap: usize) -> Result<Self> {
        if target == 0 {
            return Err(Error::InvalidTargetTokens(target));
        }
        Ok(Self {
            target,
            overlap: overlap.min(target - 1),
        })
    }

    /// A budget with no overlap between consecutive chunks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTargetTokens`] if `target == 0`.
    pub fn no_overlap(target: usize) -> Result<Self> {
        Self::new(target, 0)
    }

    /// The token count a chunk fills up to before it is emitted.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// The maximum token count carried from one chunk into the next.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Check if adding `additional` tokens to a window holding `current`
    /// would push it past the target.
    #[must_use]
    pub fn would_overflow(&self, current: usize, additional: usize) -> bool {
        current.saturating_add(additional) > self.target
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            target: 1000,
            overlap: 200,
        }
    }
}

impl TryFrom<(usize, usize)> for TokenBudget {
    type Error = Error;

    fn try_from((target, overlap): (usize, usize)) -> Result<Self> {
        Self::new(target, overlap)
    }
}
