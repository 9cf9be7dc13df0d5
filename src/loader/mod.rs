//! Format loaders and loaded documents.
//!
//! A [`Loader`] is chosen once per path from its extension. It validates the
//! path and parses the file into a [`Document`], the format-specific handle
//! an [`Extractor`](crate::Extractor) works on.

mod office;
pub mod ocr;
mod pdf;

use std::path::Path;
use std::sync::Arc;

use crate::diagnostics::{default_diagnostics, Diagnostics, Reporter, Stage};
use crate::error::{Error, Result};
use crate::extractor::ArtifactSource;
use crate::format::{has_extension, FormatTag};
use crate::parser::{DocxDocument, PdfDocument, PptxDocument};

pub use office::{DocxLoader, PptxLoader};
pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::PdfLoader;

/// A loader for one path, one variant per supported format.
pub enum Loader {
    /// PDF loader
    Pdf(PdfLoader),
    /// Word loader
    Docx(DocxLoader),
    /// PowerPoint loader
    Pptx(PptxLoader),
}

impl Loader {
    /// Select the loader for `path` by extension, logging diagnostics.
    pub fn for_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::for_path_with(path, default_diagnostics())
    }

    /// Select the loader for `path` by extension, reporting to `diagnostics`.
    ///
    /// Any extension other than `.pdf`, `.docx` or `.pptx` is rejected with
    /// [`Error::Validation`], whether or not the file exists.
    pub fn for_path_with<P: AsRef<Path>>(path: P, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let path = path.as_ref();
        match FormatTag::from_path(path) {
            FormatTag::Pdf => Ok(Loader::Pdf(PdfLoader::new(path, diagnostics))),
            FormatTag::Docx => Ok(Loader::Docx(DocxLoader::new(path, diagnostics))),
            FormatTag::Pptx => Ok(Loader::Pptx(PptxLoader::new(path, diagnostics))),
            FormatTag::Unknown => {
                let err = Error::validation(path, "unsupported file extension");
                let id = path.display().to_string();
                Reporter::new(diagnostics.as_ref(), &id).failed(Stage::Validate, None, &err);
                Err(err)
            }
        }
    }

    /// Replace the OCR engine used by PDF loaders. No effect on other formats.
    pub fn with_ocr(self, engine: Arc<dyn OcrEngine>) -> Self {
        match self {
            Loader::Pdf(loader) => Loader::Pdf(loader.with_ocr(engine)),
            other => other,
        }
    }

    /// Format this loader handles.
    pub fn format(&self) -> FormatTag {
        match self {
            Loader::Pdf(_) => FormatTag::Pdf,
            Loader::Docx(_) => FormatTag::Docx,
            Loader::Pptx(_) => FormatTag::Pptx,
        }
    }

    /// Path being loaded.
    pub fn path(&self) -> &Path {
        match self {
            Loader::Pdf(loader) => loader.path(),
            Loader::Docx(loader) => loader.path(),
            Loader::Pptx(loader) => loader.path(),
        }
    }

    /// Diagnostics the loader reports to.
    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        match self {
            Loader::Pdf(loader) => loader.diagnostics(),
            Loader::Docx(loader) => loader.diagnostics(),
            Loader::Pptx(loader) => loader.diagnostics(),
        }
    }

    /// Whether the path has the right extension and is an existing file.
    pub fn validate_file(&self) -> bool {
        is_valid(self.path(), self.format())
    }

    /// Validate and parse the file.
    pub fn load_file(&self) -> Result<Document> {
        match self {
            Loader::Pdf(loader) => loader.load_file().map(Document::Pdf),
            Loader::Docx(loader) => loader.load_file().map(Document::Docx),
            Loader::Pptx(loader) => loader.load_file().map(Document::Pptx),
        }
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("format", &self.format())
            .field("path", &self.path())
            .finish()
    }
}

/// A loaded document handle.
#[derive(Debug)]
pub enum Document {
    /// PDF handle
    Pdf(PdfDocument),
    /// Word handle
    Docx(DocxDocument),
    /// PowerPoint handle
    Pptx(PptxDocument),
}

impl Document {
    /// Format of the document.
    pub fn format(&self) -> FormatTag {
        match self {
            Document::Pdf(_) => FormatTag::Pdf,
            Document::Docx(_) => FormatTag::Docx,
            Document::Pptx(_) => FormatTag::Pptx,
        }
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        match self {
            Document::Pdf(doc) => doc.path(),
            Document::Docx(doc) => doc.path(),
            Document::Pptx(doc) => doc.path(),
        }
    }

    pub(crate) fn source(&self) -> &dyn ArtifactSource {
        match self {
            Document::Pdf(doc) => doc as &dyn ArtifactSource,
            Document::Docx(doc) => doc,
            Document::Pptx(doc) => doc,
        }
    }
}

fn is_valid(path: &Path, format: FormatTag) -> bool {
    has_extension(path, format) && path.is_file()
}

/// Validation with its diagnostic.
fn check(path: &Path, format: FormatTag, reporter: &Reporter<'_>) -> Result<()> {
    let result = if !has_extension(path, format) {
        Err(Error::validation(path, format!("expected a .{} file", format)))
    } else if !path.is_file() {
        Err(Error::validation(path, "file does not exist"))
    } else {
        Ok(())
    };

    match &result {
        Ok(()) => reporter.ok(Stage::Validate, None, 1),
        Err(e) => reporter.failed(Stage::Validate, None, e),
    }
    result
}

/// Validate, then parse with `open`; parse errors become [`Error::Extraction`].
fn load_with<T>(
    path: &Path,
    format: FormatTag,
    diagnostics: &dyn Diagnostics,
    open: impl FnOnce(&Path, &Reporter<'_>) -> Result<T>,
) -> Result<T> {
    let id = path.display().to_string();
    let reporter = Reporter::new(diagnostics, &id);

    check(path, format, &reporter)?;

    match open(path, &reporter) {
        Ok(document) => {
            reporter.ok(Stage::Load, None, 1);
            Ok(document)
        }
        Err(e) => {
            let err = if e.is_terminal() {
                e
            } else {
                Error::extraction(path, e.to_string())
            };
            reporter.failed(Stage::Load, None, &err);
            Err(err)
        }
    }
}
