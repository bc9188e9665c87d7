//! Error types for ragprep.

use std::path::PathBuf;

/// Errors that can occur while configuring chunkers or moving chunk files.
///
/// The chunkers themselves are infallible once built: configuration is
/// validated up front, and malformed text is treated as empty.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid token target (must be > 0).
    #[error("invalid target_tokens: {0} (must be > 0)")]
    InvalidTargetTokens(usize),

    /// Overlap would stop the sentence window from advancing.
    #[error("overlap_tokens {overlap} must be < target_tokens {target}")]
    OverlapExceedsTarget {
        /// The token target.
        target: usize,
        /// The overlap that reached or exceeded it.
        overlap: usize,
    },

    /// Invalid paragraph window (must be > 0).
    #[error("invalid paragraph window size: {0} (must be > 0)")]
    InvalidWindowSize(usize),

    /// Reading or writing a file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or written.
    #[error("json error in {}: {source}", path.display())]
    Json {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The configuration file is not valid TOML for [`crate::PipelineConfig`].
    #[error("config error: {0}")]
    Config(String),

    /// PDF text extraction failed.
    #[error("pdf extraction failed: {0}")]
    Pdf(String),

    /// An EPUB archive is unreadable or its package document is malformed.
    #[error("epub extraction failed: {0}")]
    Epub(String),

    /// A chunk file does not satisfy the output schema.
    #[error("invalid chunk file {}: {reason}", path.display())]
    Schema {
        /// The offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The extractor has no reader for this file type.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Whether this error comes from invalid chunking parameters.
    ///
    /// Configuration errors must abort a run before any document is touched;
    /// everything else is scoped to a single file.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidTargetTokens(_)
                | Self::OverlapExceedsTarget { .. }
                | Self::InvalidWindowSize(_)
                | Self::Config(_)
        )
    }
}

/// Result type for ragprep operations.
pub type Result<T> = std::result::Result<T, Error>;
