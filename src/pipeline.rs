//! Load, extract and persist documents through a list of sinks.
//!
//! # Example
//!
//! ```no_run
//! use docextract::{default_diagnostics, FilesystemSink, Pipeline};
//!
//! let diagnostics = default_diagnostics();
//! let mut pipeline = Pipeline::new(diagnostics.clone())
//!     .with_sink(FilesystemSink::new("out", diagnostics)?);
//!
//! let batch = pipeline.process_batch(["a.pdf", "b.docx"]);
//! println!("{} of {} documents processed", batch.succeeded().count(), batch.len());
//! # Ok::<(), docextract::Error>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::Error;
use crate::extractor::Extractor;
use crate::format::FormatTag;
use crate::loader::{Loader, OcrEngine};
use crate::sink::{SaveReport, Sink};

/// A document that could not be processed, with the stage that stopped it.
#[derive(Debug, Error)]
#[error("{}: {stage} failed: {source}", path.display())]
pub struct PipelineError {
    /// Document path
    pub path: PathBuf,
    /// Stage the error was raised in
    pub stage: Stage,
    /// Underlying error
    #[source]
    pub source: Error,
}

impl PipelineError {
    fn new(path: &Path, source: Error) -> Self {
        let stage = match source {
            Error::Validation { .. } => Stage::Validate,
            _ => Stage::Load,
        };
        Self {
            path: path.to_path_buf(),
            stage,
            source,
        }
    }
}

/// Outcome of one processed document.
#[derive(Debug)]
pub struct DocumentReport {
    /// Document path
    pub path: PathBuf,
    /// Detected format
    pub format: FormatTag,
    /// One report per sink, in sink order
    pub saves: Vec<SaveReport>,
}

impl DocumentReport {
    /// Whether every sink saved every category.
    pub fn is_complete(&self) -> bool {
        self.saves.iter().all(SaveReport::is_complete)
    }
}

/// Outcome of a batch, one entry per input path in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-document results
    pub documents: Vec<Result<DocumentReport, PipelineError>>,
}

impl BatchReport {
    /// Number of documents attempted.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the batch was empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents that were loaded and handed to the sinks.
    pub fn succeeded(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter_map(|r| r.as_ref().ok())
    }

    /// Documents that failed terminally.
    pub fn failed(&self) -> impl Iterator<Item = &PipelineError> {
        self.documents.iter().filter_map(|r| r.as_ref().err())
    }

    /// Whether any document failed terminally.
    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

/// Select the loader, load `path`, and run `save_all` on every sink in order.
///
/// Category failures end up in the returned report; only validation and
/// load failures are returned as errors.
pub fn process_file<P: AsRef<Path>>(
    path: P,
    sinks: &mut [&mut dyn Sink],
    diagnostics: Arc<dyn Diagnostics>,
    ocr: Option<Arc<dyn OcrEngine>>,
) -> Result<DocumentReport, PipelineError> {
    let path = path.as_ref();

    let mut loader = Loader::for_path_with(path, diagnostics).map_err(|e| PipelineError::new(path, e))?;
    if let Some(engine) = ocr {
        loader = loader.with_ocr(engine);
    }
    let extractor = Extractor::from_loader(&loader).map_err(|e| PipelineError::new(path, e))?;

    let saves = sinks
        .iter_mut()
        .map(|sink| sink.save_all(&extractor))
        .collect();

    Ok(DocumentReport {
        path: path.to_path_buf(),
        format: extractor.format(),
        saves,
    })
}

/// Process `paths` one after another; a failed document never stops the batch.
pub fn process_batch<I, P>(
    paths: I,
    sinks: &mut [&mut dyn Sink],
    diagnostics: Arc<dyn Diagnostics>,
    ocr: Option<Arc<dyn OcrEngine>>,
) -> BatchReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let documents = paths
        .into_iter()
        .map(|path| process_file(path, sinks, Arc::clone(&diagnostics), ocr.clone()))
        .collect();
    BatchReport { documents }
}

/// Sinks plus the diagnostics and OCR engine every document is processed with.
pub struct Pipeline {
    sinks: Vec<Box<dyn Sink>>,
    diagnostics: Arc<dyn Diagnostics>,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl Pipeline {
    /// Create a pipeline with no sinks.
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            sinks: Vec::new(),
            diagnostics,
            ocr: None,
        }
    }

    /// Append a sink.
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Append a boxed sink.
    pub fn add_sink(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    /// Use `engine` for the PDF OCR fallback instead of Tesseract.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Number of sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    fn sinks(&mut self) -> Vec<&mut dyn Sink> {
        let mut sinks: Vec<&mut dyn Sink> = Vec::with_capacity(self.sinks.len());
        for sink in self.sinks.iter_mut() {
            sinks.push(sink.as_mut());
        }
        sinks
    }

    /// Process one document.
    pub fn process_file<P: AsRef<Path>>(&mut self, path: P) -> Result<DocumentReport, PipelineError> {
        let diagnostics = Arc::clone(&self.diagnostics);
        let ocr = self.ocr.clone();
        process_file(path, &mut self.sinks(), diagnostics, ocr)
    }

    /// Process documents sequentially.
    pub fn process_batch<I, P>(&mut self, paths: I) -> BatchReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let diagnostics = Arc::clone(&self.diagnostics);
        let ocr = self.ocr.clone();
        process_batch(paths, &mut self.sinks(), diagnostics, ocr)
    }

    /// Release the sinks, closing any database connection.
    pub fn into_sinks(self) -> Vec<Box<dyn Sink>> {
        self.sinks
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("ocr", &self.ocr.is_some())
            .finish_non_exhaustive()
    }
}
