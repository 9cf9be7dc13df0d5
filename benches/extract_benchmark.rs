//! Benchmarks for extraction performance.
//!
//! Run with: cargo bench
//!
//! Documents are generated into a temporary directory before measuring.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docextract::parser::{TableDetector, TextSpan};
use docextract::{Extractor, MemoryDiagnostics};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_DOC: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Word document with `paragraphs` paragraphs and a table every ten paragraphs.
fn write_docx(path: &Path, paragraphs: usize) {
    let mut body = String::new();
    for i in 0..paragraphs {
        body.push_str(&format!(
            "<w:p><w:r><w:t>Paragraph {} of the benchmark document.</w:t></w:r></w:p>",
            i + 1
        ));
        if i % 10 == 9 {
            body.push_str("<w:tbl>");
            for row in 0..4 {
                body.push_str("<w:tr>");
                for col in 0..3 {
                    body.push_str(&format!("<w:tc><w:p><w:r><w:t>r{}c{}</w:t></w:r></w:p></w:tc>", row, col));
                }
                body.push_str("</w:tr>");
            }
            body.push_str("</w:tbl>");
        }
    }

    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
        W_NS, body
    );
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="word/document.xml"/></Relationships>"#,
        REL_NS, OFFICE_DOC
    );

    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Spans laid out as a `rows` x 4 grid.
fn grid_spans(rows: usize) -> Vec<TextSpan> {
    let mut spans = Vec::with_capacity(rows * 4);
    for row in 0..rows {
        let y = 750.0 - row as f32 * 14.0;
        for col in 0..4 {
            spans.push(TextSpan::new(format!("cell {}-{}", row, col), 72.0 + col as f32 * 120.0, y, 10.0));
        }
    }
    spans
}

/// Benchmark DOCX load plus text and table extraction.
fn bench_docx_extraction(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut group = c.benchmark_group("docx_extraction");

    for paragraphs in [10, 100, 1000] {
        let path = dir.path().join(format!("bench_{}.docx", paragraphs));
        write_docx(&path, paragraphs);

        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &path, |b, path| {
            b.iter(|| {
                let extractor = Extractor::open_with(black_box(path), Arc::new(MemoryDiagnostics::new())).unwrap();
                let text = extractor.extract_text().unwrap();
                let tables = extractor.extract_tables().unwrap();
                black_box((text, tables))
            });
        });
    }

    group.finish();
}

/// Benchmark layout-based table detection.
fn bench_table_detection(c: &mut Criterion) {
    let detector = TableDetector::new();
    let mut group = c.benchmark_group("table_detection");

    for rows in [5, 50, 200] {
        let spans = grid_spans(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &spans, |b, spans| {
            b.iter(|| detector.detect(black_box(spans)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_docx_extraction, bench_table_detection);
criterion_main!(benches);
