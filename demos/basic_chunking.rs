//! Basic Chunking
//!
//! The minimal example: split prose into sentence windows and assemble them
//! into chunks ready for an embedding index.
//!
//! ```bash
//! cargo run --example basic_chunking
//! ```

use ragprep::{ChunkAssembler, ChunkMetadata, ChunkTemplate, Chunker, SentenceWindowChunker};

fn main() -> anyhow::Result<()> {
    let document = "Machine learning models learn patterns from data. \
        They generalize these patterns to make predictions. \
        This is fundamentally different from traditional programming. \
        Deep learning extends this with multiple hidden layers. \
        Each layer learns increasingly abstract representations.";

    // Windows of up to 16 tokens, carrying up to 8 tokens into the next one
    let chunker = SentenceWindowChunker::with_tokens(16, 8)?;
    let passages = chunker.chunk(document);

    let template = ChunkTemplate::new(
        "notes/ml_intro",
        ChunkMetadata::new("ml_intro").with_source_file("ml_intro"),
    );
    let chunks = ChunkAssembler::default().assemble_all(passages, &template);

    println!("Document: {} chars", document.len());
    println!("Chunks: {}\n", chunks.len());

    for chunk in &chunks {
        println!("{chunk}");
        println!("    \"{}\"\n", chunk.content);
    }

    // The stored form, one object per chunk
    if let Some(first) = chunks.first() {
        println!("{}", serde_json::to_string_pretty(first)?);
    }

    Ok(())
}
