//! # docextract
//!
//! Extract text, links, images, tables and metadata from PDF, DOCX and PPTX
//! documents and persist them to a directory tree or a SQL database.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docextract::{DatabaseConfig, Extractor, FilesystemSink, RelationalSink, Sink};
//!
//! fn main() -> docextract::Result<()> {
//!     let extractor = Extractor::open("report.pdf")?;
//!     println!("{}", extractor.extract_text()?);
//!
//!     let diagnostics = extractor.diagnostics().clone();
//!     let mut files = FilesystemSink::new("out", diagnostics.clone())?;
//!     files.save_all(&extractor);
//!
//!     let mut db = RelationalSink::connect(&DatabaseConfig::sqlite("out/artifacts.db"), diagnostics)?;
//!     let report = db.save_all(&extractor);
//!     assert!(report.is_complete());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Three formats, one contract**: every format yields the same five artifact categories
//! - **OCR fallback**: PDFs without a text layer go through `pdftoppm` and `tesseract`
//! - **Layout tables**: PDF tables are rebuilt from text positions
//! - **Two sinks**: plain files (text, CSV, original image bytes) or MySQL/SQLite rows
//! - **Isolated failures**: a bad image or table never costs the rest of the document

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod format;
pub mod loader;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod sink;

// Re-export commonly used types
pub use config::{DatabaseBackend, DatabaseConfig, OcrConfig};
pub use diagnostics::{
    default_diagnostics, Diagnostics, Event, LogDiagnostics, MemoryDiagnostics, Outcome, Reporter,
    Stage,
};
pub use error::{Error, Result};
pub use extractor::{
    ArtifactSource, Extractor, ImageSource, LinkSource, MetadataSource, TableSource, TextSource,
};
pub use format::FormatTag;
pub use loader::{Document, DocxLoader, Loader, OcrEngine, PdfLoader, PptxLoader, TesseractOcr};
pub use model::{Category, ImageBlob, Link, Metadata, Table};
pub use pipeline::{BatchReport, DocumentReport, Pipeline, PipelineError};
pub use sink::{FilesystemSink, RelationalSink, SaveReport, Sink};

use std::path::Path;

/// Extract the plain text of a document.
///
/// # Example
///
/// ```no_run
/// let text = docextract::extract_text("slides.pptx").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Extractor::open(path)?.extract_text()
}

/// Extract the hyperlinks of a document.
pub fn extract_links<P: AsRef<Path>>(path: P) -> Result<Vec<Link>> {
    Extractor::open(path)?.extract_links()
}

/// Extract the tables of a document.
///
/// # Example
///
/// ```no_run
/// for table in docextract::extract_tables("report.docx").unwrap() {
///     println!("{}", table.to_delimited());
/// }
/// ```
pub fn extract_tables<P: AsRef<Path>>(path: P) -> Result<Vec<Table>> {
    Extractor::open(path)?.extract_tables()
}

/// Extract the metadata of a document.
pub fn extract_metadata<P: AsRef<Path>>(path: P) -> Result<Metadata> {
    Extractor::open(path)?.extract_metadata()
}

/// Extract every category of a document into `out_dir`.
///
/// # Example
///
/// ```no_run
/// let report = docextract::extract_to_dir("report.pdf", "out").unwrap();
/// assert_eq!(report.sink(), "filesystem");
/// ```
pub fn extract_to_dir<P: AsRef<Path>, Q: AsRef<Path>>(path: P, out_dir: Q) -> Result<SaveReport> {
    let extractor = Extractor::open(path)?;
    let mut sink = FilesystemSink::new(out_dir.as_ref(), extractor.diagnostics().clone())?;
    Ok(sink.save_all(&extractor))
}
