//! Benchmarks for the chunkers, the assembler and whole-document processing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ragprep::{
    ChunkAssembler, ChunkMetadata, ChunkTemplate, Chunker, Document, MarkdownChunker, Pipeline,
    PipelineConfig, SentenceWindowChunker,
};

const SENTENCES: [&str; 5] = [
    "The quick brown fox jumps over the lazy dog. ",
    "Pack my box with five dozen liquor jugs. ",
    "How vexingly quick daft zebras jump! ",
    "The five boxing wizards jump quickly. ",
    "Sphinx of black quartz, judge my vow. ",
];

fn sample_text(size: usize) -> String {
    let mut text = String::with_capacity(size + 64);
    let mut i = 0;
    while text.len() < size {
        text.push_str(SENTENCES[i % SENTENCES.len()]);
        i += 1;
    }
    text
}

fn sample_markdown(size: usize) -> String {
    let mut text = String::with_capacity(size + 256);
    let mut section = 0;
    while text.len() < size {
        if section % 4 == 0 {
            text.push_str(&format!("# Chapter {section}\n\n"));
        } else {
            text.push_str(&format!("## Section {section}\n\n"));
        }
        for i in 0..3 {
            text.push_str(&sample_text(120 + 40 * i));
            text.push_str("\n\n");
        }
        section += 1;
    }
    text
}

fn template() -> ChunkTemplate {
    ChunkTemplate::new("bench/doc", ChunkMetadata::new("doc"))
}

fn bench_sentence_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("sentence_windows");

    for size in [1_000, 10_000, 100_000] {
        let text = sample_text(size);
        let chunker = SentenceWindowChunker::default();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("default", size), &text, |b, text| {
            b.iter(|| chunker.chunk(black_box(text)))
        });
    }

    // Small targets emit many windows and exercise the overlap path
    let text = sample_text(10_000);
    let chunker = SentenceWindowChunker::with_tokens(40, 15).unwrap();
    group.bench_function("small_target/10000", |b| {
        b.iter(|| chunker.chunk(black_box(&text)))
    });

    group.finish();
}

fn bench_markdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("markdown");

    for size in [1_000, 10_000, 100_000] {
        let text = sample_markdown(size);
        let sections = MarkdownChunker::heading_section();
        let windows = MarkdownChunker::paragraph_window(4, 1).unwrap();

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("sections", size), &text, |b, text| {
            b.iter(|| sections.chunk(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("windows", size), &text, |b, text| {
            b.iter(|| windows.chunk(black_box(text)))
        });
    }

    group.finish();
}

fn bench_assembler(c: &mut Criterion) {
    let text = sample_text(100_000);
    let passages = SentenceWindowChunker::default().chunk(&text);
    let assembler = ChunkAssembler::default();
    let template = template();

    c.bench_function("assemble/100000", |b| {
        b.iter(|| assembler.assemble_all(black_box(passages.clone()), &template))
    });
}

fn bench_process_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_document");
    let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();

    let prose = Document::prose("doc", "bench/doc", sample_text(100_000));
    let markdown = Document::markdown("doc", "bench/doc", sample_markdown(100_000));

    group.throughput(Throughput::Bytes(100_000));
    group.bench_function("prose", |b| {
        b.iter(|| pipeline.process_document(black_box(&prose)))
    });
    group.bench_function("markdown", |b| {
        b.iter(|| pipeline.process_document(black_box(&markdown)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sentence_windows,
    bench_markdown,
    bench_assembler,
    bench_process_document
);
criterion_main!(benches);
