//! End-to-end tests: load, extract, persist through several sinks.

mod common;

use std::fs;

use common::{diagnostics, png_bytes, DocxFixture, FakeOcr, PdfFixture, PptxFixture, SlideFixture};
use docextract::pipeline::process_batch;
use docextract::{
    Category, DatabaseConfig, FilesystemSink, FormatTag, Pipeline, RelationalSink, Sink, Stage,
};

#[test]
fn test_mixed_batch() {
    let dir = tempfile::tempdir().unwrap();
    let docx = dir.path().join("report.docx");
    let pptx = dir.path().join("deck.pptx");
    let pdf = dir.path().join("scan.pdf");
    let corrupt = dir.path().join("corrupt.docx");
    DocxFixture::new().paragraph("Report body").image(png_bytes(2, 2)).write(&docx);
    PptxFixture::new()
        .slide(SlideFixture::new().text("Slide one").link("x", "https://x.example"))
        .write(&pptx);
    PdfFixture::new().text_at(72.0, 700.0, "Body").write(&pdf);
    let notes = dir.path().join("notes.txt");
    fs::write(&corrupt, b"not a package").unwrap();

    let memory = diagnostics();
    let mut files = FilesystemSink::new(dir.path().join("out"), memory.clone()).unwrap();
    let mut database =
        RelationalSink::connect(&DatabaseConfig::sqlite(dir.path().join("out.db")), memory.clone()).unwrap();

    let batch = {
        let mut sinks: Vec<&mut dyn Sink> = Vec::new();
        sinks.push(&mut files);
        sinks.push(&mut database);
        process_batch(
            [&docx, &pptx, &pdf, &corrupt, &notes],
            &mut sinks,
            memory.clone(),
            Some(FakeOcr::reading("recognized")),
        )
    };

    assert_eq!(batch.len(), 5);
    assert_eq!(batch.succeeded().count(), 3);

    let failed: Vec<Stage> = batch.failed().map(|e| e.stage).collect();
    assert_eq!(failed, vec![Stage::Load, Stage::Validate]);

    for report in batch.succeeded() {
        assert_eq!(report.saves.len(), 2);
        assert!(report.is_complete(), "{} incomplete", report.path.display());
    }

    assert!(files.text_path(FormatTag::Docx).is_file());
    assert!(files.text_path(FormatTag::Pptx).is_file());
    assert!(files.text_path(FormatTag::Pdf).is_file());
    assert!(files.image_path(FormatTag::Docx, 1, "png").is_file());
    assert_eq!(
        fs::read_to_string(files.links_path(FormatTag::Pptx)).unwrap(),
        "https://x.example\n"
    );

    assert_eq!(database.row_count(Category::Text).unwrap(), 3);
    assert_eq!(database.row_count(Category::Links).unwrap(), 1);
    assert_eq!(database.row_count(Category::Images).unwrap(), 1);
}

#[test]
fn test_pipeline_owns_its_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let docx = dir.path().join("a.docx");
    DocxFixture::new().paragraph("hello").write(&docx);

    let memory = diagnostics();
    let mut pipeline = Pipeline::new(memory.clone())
        .with_sink(FilesystemSink::new(dir.path().join("out"), memory.clone()).unwrap())
        .with_ocr(FakeOcr::failing());
    assert_eq!(pipeline.sink_count(), 1);

    let report = pipeline.process_file(&docx).unwrap();
    assert_eq!(report.format, FormatTag::Docx);
    assert!(report.is_complete());
    assert_eq!(
        fs::read_to_string(dir.path().join("out/text/docx_text.txt")).unwrap(),
        "hello"
    );

    let persisted = memory
        .events()
        .into_iter()
        .filter(|e| e.stage == Stage::Persist)
        .count();
    assert_eq!(persisted, 5);
    assert_eq!(pipeline.into_sinks().len(), 1);
}

#[test]
fn test_pipeline_without_sinks_still_validates() {
    let memory = diagnostics();
    let mut pipeline = Pipeline::new(memory.clone());
    let err = pipeline.process_file("missing.pptx").unwrap_err();

    assert_eq!(err.stage, Stage::Validate);
    assert!(err.to_string().contains("missing.pptx"));
}
