//! Chunking Strategies Comparison
//!
//! Runs one markdown document through the three chunking strategies and shows
//! what each keeps and what each loses.
//!
//! ```bash
//! cargo run --example chunking_strategies
//! ```

use ragprep::{
    ChunkAssembler, ChunkMetadata, ChunkTemplate, Chunker, MarkdownChunker, Passage,
    SentenceWindowChunker,
};

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    flat.chars().take(60).collect()
}

fn show(passages: &[Passage]) {
    println!("   Passages: {}", passages.len());
    for p in passages {
        let path = if p.headings.is_empty() {
            "-".to_string()
        } else {
            p.headings.join(" > ")
        };
        println!(
            "   [{}] {} chars, path {}, title {}: \"{}...\"",
            p.index,
            p.len(),
            path,
            p.title.as_deref().unwrap_or("-"),
            preview(&p.text)
        );
    }
}

fn main() -> ragprep::Result<()> {
    println!("Chunking Strategies");
    println!("===================\n");

    let document = r"# Backpropagation

Machine learning models learn patterns from data. They generalize these patterns to make predictions on new, unseen examples. This is fundamentally different from traditional programming, where humans write explicit rules.

## Training

The training process involves three key steps. The forward pass produces predictions. The loss compares them against ground truth. Backpropagation sends gradients backward and updates the weights.

## History

Dr. Geoffrey Hinton pioneered backpropagation in the 1980s. His work at the University of Toronto laid the foundation for modern AI.

```text
# not a heading: fenced code keeps its comments
loss.backward()
```";

    println!("Document length: {} characters\n", document.len());

    // Strategy 1: sentence windows
    println!("1. Sentence Windows");
    println!("   ----------------");
    println!("   Token-bounded windows of whole sentences with overlap. Ignores headings.\n");

    let sentences = SentenceWindowChunker::with_tokens(40, 15)?;
    show(&sentences.chunk(document));
    println!("\n   Note: \"Dr.\" does not end a sentence (UAX #29 segmentation).");

    // Strategy 2: heading sections
    println!("\n2. Heading Sections");
    println!("   ----------------");
    println!("   One passage per section, tagged with its heading path.\n");

    let sections = MarkdownChunker::heading_section();
    let passages = sections.chunk(document);
    show(&passages);
    println!("\n   Note: the '#' line inside the code fence did not open a section.");

    // Strategy 3: paragraph windows
    println!("\n3. Paragraph Windows");
    println!("   -----------------");
    println!("   Sliding windows of whole paragraphs, titled by their first heading.\n");

    let windows = MarkdownChunker::paragraph_window(3, 1)?;
    show(&windows.chunk(document));

    // Assembly: short passages are dropped, survivors get stable ids
    println!("\n--- Assembled heading sections ---\n");
    let template = ChunkTemplate::new("docs/backprop", ChunkMetadata::new("backprop"));
    for chunk in ChunkAssembler::default().assemble_all(passages, &template) {
        println!(
            "   {} [{}]",
            chunk,
            chunk.metadata.section_path.as_deref().unwrap_or("-")
        );
    }

    println!("\n--- Summary ---\n");
    println!("| Strategy          | Bounded by | Keeps structure | Best For            |");
    println!("|-------------------|------------|-----------------|---------------------|");
    println!("| Sentence windows  | tokens     | No              | PDF pages, HTML     |");
    println!("| Heading sections  | headings   | Yes (path)      | Docs, wikis         |");
    println!("| Paragraph windows | paragraphs | Partly (title)  | Loose markdown      |");

    Ok(())
}
