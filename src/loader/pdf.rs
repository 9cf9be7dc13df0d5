//! PDF loader: primary text extraction with an OCR fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::format::FormatTag;
use crate::parser::pdf::{primary_text, PdfDocument};

use super::load_with;
use super::ocr::{recognize_document, OcrEngine, TesseractOcr};

/// Loads `.pdf` files.
pub struct PdfLoader {
    path: PathBuf,
    ocr: Arc<dyn OcrEngine>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl PdfLoader {
    /// Create a loader for `path` using the default Tesseract engine for OCR.
    pub fn new(path: impl Into<PathBuf>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            path: path.into(),
            ocr: Arc::new(TesseractOcr::default()),
            diagnostics,
        }
    }

    /// Use `engine` for the OCR fallback.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = engine;
        self
    }

    /// Path being loaded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostics the loader reports to.
    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }

    /// Validate the path and load its text.
    ///
    /// Blank or failed primary extraction falls back to OCR, once. Fails with
    /// [`Error::Extraction`] when neither produces text.
    pub fn load_file(&self) -> Result<PdfDocument> {
        load_with(&self.path, FormatTag::Pdf, self.diagnostics.as_ref(), |path, reporter| {
            match primary_text(path) {
                Ok(text) if !text.trim().is_empty() => return Ok(PdfDocument::new(path, text)),
                Ok(_) => log::info!("{}: no text layer, falling back to OCR", path.display()),
                Err(e) => log::warn!("{}: text extraction failed ({}), falling back to OCR", path.display(), e),
            }

            let text = recognize_document(self.ocr.as_ref(), path, reporter)
                .map_err(|e| Error::extraction(path, format!("no extractable text and OCR failed: {}", e)))?;
            Ok(PdfDocument::new(path, text))
        })
    }
}
