//! Configuration.
//!
//! Everything is explicit: a [`PipelineConfig`] is loaded once (from TOML or
//! defaults), validated, and passed to [`Pipeline::new`](crate::Pipeline::new).
//! Nothing reads the environment except the log filter.
//!
//! ```toml
//! [chunking]
//! target_tokens = 800
//! overlap_tokens = 150
//! min_chars = 40
//!
//! [chunking.markdown]
//! policy = "paragraph-window"
//! window_size = 4
//! window_overlap = 1
//!
//! [filter]
//! enabled = true
//!
//! [output]
//! max_file_bytes = 52428800
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assembler::{ChunkAssembler, DEFAULT_MIN_CHARS};
use crate::budget::TokenBudget;
use crate::error::{Error, Result};
use crate::filter::{BoilerplateFilter, DEFAULT_PATTERNS};
use crate::markdown::{MarkdownChunker, MarkdownPolicy};
use crate::sentence::SentenceWindowChunker;

/// Markdown policy selector as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkdownPolicyKind {
    /// One chunk per heading section.
    #[default]
    HeadingSection,
    /// Sliding paragraph windows.
    ParagraphWindow,
}

impl std::str::FromStr for MarkdownPolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "heading-section" | "heading" => Ok(Self::HeadingSection),
            "paragraph-window" | "paragraph" => Ok(Self::ParagraphWindow),
            other => Err(Error::Config(format!("unknown markdown policy: {other}"))),
        }
    }
}

/// Markdown chunking settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Grouping policy.
    pub policy: MarkdownPolicyKind,
    /// Paragraphs per window (paragraph-window policy).
    pub window_size: usize,
    /// Paragraphs shared by consecutive windows (paragraph-window policy).
    pub window_overlap: usize,
    /// Re-window heading sections longer than `target_tokens`.
    pub split_oversized: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            policy: MarkdownPolicyKind::HeadingSection,
            window_size: 4,
            window_overlap: 1,
            split_oversized: false,
        }
    }
}

/// Chunking settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target tokens per sentence window.
    pub target_tokens: usize,
    /// Tokens carried between consecutive windows. Must be below the target.
    pub overlap_tokens: usize,
    /// Minimum trimmed characters for a chunk to be kept.
    pub min_chars: usize,
    /// Markdown settings.
    pub markdown: MarkdownConfig,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_tokens: 1000,
            overlap_tokens: 200,
            min_chars: DEFAULT_MIN_CHARS,
            markdown: MarkdownConfig::default(),
        }
    }
}

impl ChunkingConfig {
    /// The validated token budget.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target_tokens == 0` or
    /// `overlap_tokens >= target_tokens`.
    pub fn budget(&self) -> Result<TokenBudget> {
        TokenBudget::new(self.target_tokens, self.overlap_tokens)
    }

    /// The markdown policy with its parameters.
    #[must_use]
    pub fn markdown_policy(&self) -> MarkdownPolicy {
        match self.markdown.policy {
            MarkdownPolicyKind::HeadingSection => MarkdownPolicy::HeadingSection,
            MarkdownPolicyKind::ParagraphWindow => MarkdownPolicy::ParagraphWindow {
                window_size: self.markdown.window_size,
                overlap: self.markdown.window_overlap,
            },
        }
    }

    /// Check every setting, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns the configuration error for the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.budget()?;
        MarkdownChunker::from_policy(self.markdown_policy())?;
        Ok(())
    }

    /// Build the sentence-window chunker.
    ///
    /// # Errors
    ///
    /// See [`ChunkingConfig::budget`].
    pub fn sentence_chunker(&self) -> Result<SentenceWindowChunker> {
        Ok(SentenceWindowChunker::new(self.budget()?))
    }

    /// Build the markdown chunker.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid budget (when
    /// `split_oversized` is set) or a zero paragraph window.
    pub fn markdown_chunker(&self) -> Result<MarkdownChunker> {
        let chunker = MarkdownChunker::from_policy(self.markdown_policy())?;
        if self.markdown.split_oversized {
            Ok(chunker.with_section_splitting(self.sentence_chunker()?))
        } else {
            Ok(chunker)
        }
    }

    /// Build the assembler.
    #[must_use]
    pub fn assembler(&self) -> ChunkAssembler {
        ChunkAssembler::new(self.min_chars)
    }
}

/// Boilerplate filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Whether `ingest` filters its output.
    pub enabled: bool,
    /// Case-insensitive regex patterns.
    pub patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: DEFAULT_PATTERNS.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

impl FilterConfig {
    /// Compile the filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a pattern is invalid.
    pub fn build(&self) -> Result<BoilerplateFilter> {
        BoilerplateFilter::new(&self.patterns)
    }
}

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Maximum serialized bytes per split file.
    pub max_file_bytes: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 50 * MIB,
        }
    }
}

const MIB: usize = 1024 * 1024;

impl OutputConfig {
    /// Set `max_file_bytes` from a size in MiB.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `mib` is zero or the byte count does not
    /// fit in `usize`.
    pub fn set_max_mib(&mut self, mib: usize) -> Result<()> {
        self.max_file_bytes = mib
            .checked_mul(MIB)
            .filter(|&bytes| bytes > 0)
            .ok_or_else(|| Error::Config(format!("max file size of {mib} MiB is out of range")))?;
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Log severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Per-document detail.
    Debug,
    /// Batch summaries.
    #[default]
    Info,
    /// Skipped documents.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log format.
    pub format: LogFormat,
    /// Default level when `RUST_LOG` is unset.
    pub level: LogLevel,
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chunking.
    pub chunking: ChunkingConfig,
    /// Boilerplate filtering.
    pub filter: FilterConfig,
    /// Output splitting.
    pub output: OutputConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Parse TOML. Missing tables and keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on invalid TOML or invalid values.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate chunking parameters and filter patterns.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.filter.enabled {
            self.filter.build()?;
        }
        if self.output.max_file_bytes == 0 {
            return Err(Error::Config("output.max_file_bytes must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Load configuration from `path`, or defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file exists but cannot be read, or
/// [`Error::Config`] if it is invalid.
pub fn load(path: &Path) -> Result<PipelineConfig> {
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    PipelineConfig::from_toml(&content)
}
