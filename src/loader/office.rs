//! Loaders for Office Open XML packages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::format::FormatTag;
use crate::parser::{DocxDocument, PptxDocument};

use super::load_with;

/// Loads `.docx` files.
pub struct DocxLoader {
    path: PathBuf,
    diagnostics: Arc<dyn Diagnostics>,
}

impl DocxLoader {
    /// Create a loader for `path`.
    pub fn new(path: impl Into<PathBuf>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            path: path.into(),
            diagnostics,
        }
    }

    /// Path being loaded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostics the loader reports to.
    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }

    /// Validate and parse the package.
    pub fn load_file(&self) -> Result<DocxDocument> {
        load_with(&self.path, FormatTag::Docx, self.diagnostics.as_ref(), |path, _| {
            DocxDocument::open(path)
        })
    }
}

/// Loads `.pptx` files.
pub struct PptxLoader {
    path: PathBuf,
    diagnostics: Arc<dyn Diagnostics>,
}

impl PptxLoader {
    /// Create a loader for `path`.
    pub fn new(path: impl Into<PathBuf>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            path: path.into(),
            diagnostics,
        }
    }

    /// Path being loaded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostics the loader reports to.
    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }

    /// Validate and parse the package.
    pub fn load_file(&self) -> Result<PptxDocument> {
        load_with(&self.path, FormatTag::Pptx, self.diagnostics.as_ref(), |path, _| {
            PptxDocument::open(path)
        })
    }
}
