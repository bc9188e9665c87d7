//! ragprep: chunk a folder of documents into RAG-ready JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragprep::config::{self, LogFormat, LoggingConfig, MarkdownPolicyKind};
use ragprep::{
    clean_chunks, inject_titles_dir, read_chunks, split_by_size, validate_dir, write_chunks,
    write_parts, Pipeline,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragprep")]
#[command(about = "Chunk documents into token-bounded passages with provenance metadata")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "ragprep.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and chunk every document in a directory
    Ingest {
        /// Input directory
        input: PathBuf,

        /// Output chunk file
        #[arg(short, long)]
        output: PathBuf,

        /// Target tokens per chunk
        #[arg(long)]
        target_tokens: Option<usize>,

        /// Tokens repeated between consecutive chunks
        #[arg(long)]
        overlap_tokens: Option<usize>,

        /// Minimum characters for a chunk to be kept
        #[arg(long)]
        min_chars: Option<usize>,

        /// Markdown policy (heading-section, paragraph-window)
        #[arg(long)]
        markdown_policy: Option<MarkdownPolicyKind>,

        /// Keep boilerplate chunks
        #[arg(long)]
        no_filter: bool,
    },

    /// Strip images, tags and extra whitespace from a chunk file
    Clean {
        /// Input chunk file
        input: PathBuf,

        /// Output chunk file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Drop boilerplate chunks from a chunk file
    Filter {
        /// Input chunk file
        input: PathBuf,

        /// Output chunk file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a chunk file by site or document into size-bounded files
    Split {
        /// Input chunk file
        input: PathBuf,

        /// Output directory
        output_dir: PathBuf,

        /// Maximum file size in MiB
        #[arg(long)]
        max_mb: Option<usize>,
    },

    /// Check every chunk file in a directory against the output schema and size limit
    Validate {
        /// Directory of chunk files
        dir: PathBuf,

        /// Maximum file size in MiB (defaults to output.max_file_bytes)
        #[arg(long)]
        max_mb: Option<usize>,
    },

    /// Add missing titles to every chunk file in a directory
    Titles {
        /// Directory of chunk files
        dir: PathBuf,
    },
}

fn init_logging(logging: &LoggingConfig, verbose: u8) {
    let default_level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Ingest {
            input,
            output,
            target_tokens,
            overlap_tokens,
            min_chars,
            markdown_policy,
            no_filter,
        } => {
            let chunking = &mut config.chunking;
            if let Some(target) = target_tokens {
                chunking.target_tokens = target;
            }
            if let Some(overlap) = overlap_tokens {
                chunking.overlap_tokens = overlap;
            }
            if let Some(min) = min_chars {
                chunking.min_chars = min;
            }
            if let Some(policy) = markdown_policy {
                chunking.markdown.policy = policy;
            }
            if no_filter {
                config.filter.enabled = false;
            }

            let pipeline = Pipeline::new(&config).context("invalid chunking configuration")?;
            let report = pipeline
                .ingest_dir(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            write_chunks(&output, &report.chunks)?;

            info!(
                chunks = report.chunks.len(),
                documents = report.documents,
                skipped = report.skipped.len(),
                output = %output.display(),
                "wrote chunks"
            );
        }
        Commands::Clean { input, output } => {
            let chunks = read_chunks(&input)?;
            let before = chunks.len();
            let cleaned = clean_chunks(chunks, &config.chunking.assembler());
            write_chunks(&output, &cleaned)?;
            info!(kept = cleaned.len(), dropped = before - cleaned.len(), "cleaned chunks");
        }
        Commands::Filter { input, output } => {
            let filter = config.filter.build()?;
            let chunks = read_chunks(&input)?;
            let before = chunks.len();
            let kept = filter.apply(chunks);
            write_chunks(&output, &kept)?;
            info!(kept = kept.len(), dropped = before - kept.len(), "filtered chunks");
        }
        Commands::Split {
            input,
            output_dir,
            max_mb,
        } => {
            if let Some(mb) = max_mb {
                config.output.set_max_mib(mb).context("invalid --max-mb")?;
            }
            let parts = split_by_size(read_chunks(&input)?, config.output.max_file_bytes);
            let written = write_parts(&output_dir, &parts)?;
            info!(files = written.len(), dir = %output_dir.display(), "split chunks");
        }
        Commands::Validate { dir, max_mb } => {
            if let Some(mb) = max_mb {
                config.output.set_max_mib(mb).context("invalid --max-mb")?;
            }
            let report = validate_dir(&dir, Some(config.output.max_file_bytes as u64))?;
            if !report.is_ok() {
                warn!(
                    invalid = report.invalid.len(),
                    oversized = report.oversized.len(),
                    "validation failed"
                );
                return Ok(ExitCode::FAILURE);
            }
            info!(files = report.valid.len(), "all files passed schema and size validation");
        }
        Commands::Titles { dir } => {
            let injected = inject_titles_dir(&dir)?;
            info!(injected, "injected titles");
        }
    }

    Ok(ExitCode::SUCCESS)
}
