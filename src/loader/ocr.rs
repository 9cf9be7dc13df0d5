//! OCR fallback for PDFs without a text layer.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::config::OcrConfig;
use crate::diagnostics::{Reporter, Stage};
use crate::error::{Error, Result};
use crate::model::Category;

/// Page rasterizer and recognizer.
pub trait OcrEngine: Send + Sync {
    /// Render every page of `pdf` into `out_dir`; returns the images in page order.
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;

    /// Recognize the text of one page image.
    fn recognize(&self, page: &Path) -> Result<String>;
}

/// Poppler's `pdftoppm` plus the `tesseract` CLI.
#[derive(Debug, Clone, Default)]
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    /// Create an engine with the given binaries and options.
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Engine options.
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }
}

fn run(command: &mut Command, program: &Path) -> Result<Output> {
    let output = command
        .output()
        .map_err(|e| Error::Ocr(format!("failed to run {}: {}", program.display(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Ocr(format!(
            "{} failed ({}): {}",
            program.display(),
            output.status,
            stderr.trim()
        )));
    }

    Ok(output)
}

impl OcrEngine for TesseractOcr {
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let program = &self.config.pdftoppm;
        run(
            Command::new(program)
                .arg("-png")
                .arg("-r")
                .arg(self.config.dpi.to_string())
                .arg(pdf)
                .arg(out_dir.join("page")),
            program,
        )?;

        // pdftoppm zero-pads page numbers, so name order is page order.
        let mut pages = Vec::new();
        for entry in fs::read_dir(out_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("png") {
                pages.push(path);
            }
        }
        pages.sort();
        Ok(pages)
    }

    fn recognize(&self, page: &Path) -> Result<String> {
        let program = &self.config.tesseract;
        let output = run(
            Command::new(program)
                .arg(page)
                .arg("stdout")
                .arg("-l")
                .arg(&self.config.language),
            program,
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Rasterize and recognize every page of `pdf`.
///
/// A page that fails recognition is reported as skipped and contributes no
/// text. Fails when rasterization fails, yields no pages, or every page fails.
pub fn recognize_document(engine: &dyn OcrEngine, pdf: &Path, reporter: &Reporter<'_>) -> Result<String> {
    let scratch = tempfile::tempdir()?;
    let pages = engine.rasterize(pdf, scratch.path())?;
    if pages.is_empty() {
        return Err(Error::Ocr("rasterizer produced no pages".to_string()));
    }

    let mut text = String::new();
    let mut recognized = 0;
    for (i, page) in pages.iter().enumerate() {
        match engine.recognize(page) {
            Ok(page_text) => {
                text.push_str(&page_text);
                recognized += 1;
            }
            Err(e) => reporter.skipped(Stage::Ocr, Some(Category::Text), i + 1, e),
        }
    }

    if recognized == 0 {
        return Err(Error::Ocr(format!("all {} pages failed recognition", pages.len())));
    }

    reporter.ok(Stage::Ocr, Some(Category::Text), recognized);
    Ok(text)
}
