//! The format-independent extraction contract.
//!
//! Every loaded document implements one capability trait per artifact
//! category. [`Extractor`] wraps a loaded [`Document`] and exposes the five
//! categories with the same signatures regardless of format; each call
//! stands alone, so one failing category never affects another.

use std::path::Path;
use std::sync::Arc;

use crate::diagnostics::{default_diagnostics, Diagnostics, Reporter, Stage};
use crate::error::Result;
use crate::format::FormatTag;
use crate::loader::{Document, Loader};
use crate::model::{Category, ImageBlob, Link, Metadata, Table};

/// Plain text of a document.
pub trait TextSource {
    /// Full text; may be empty.
    fn text(&self, reporter: &Reporter<'_>) -> Result<String>;
}

/// Hyperlinks of a document.
pub trait LinkSource {
    /// Links in document order.
    fn links(&self, reporter: &Reporter<'_>) -> Result<Vec<Link>>;
}

/// Embedded pictures of a document.
pub trait ImageSource {
    /// Picture payloads in document order. Pictures that cannot be read are
    /// reported as skipped and left out.
    fn images(&self, reporter: &Reporter<'_>) -> Result<Vec<ImageBlob>>;
}

/// Tables of a document.
pub trait TableSource {
    /// Tables in document order.
    fn tables(&self, reporter: &Reporter<'_>) -> Result<Vec<Table>>;
}

/// Document properties.
pub trait MetadataSource {
    /// Fixed keys plus format-specific extras.
    fn metadata(&self, reporter: &Reporter<'_>) -> Result<Metadata>;
}

/// Everything an [`Extractor`] needs from a document.
pub trait ArtifactSource: TextSource + LinkSource + ImageSource + TableSource + MetadataSource {}

impl<T> ArtifactSource for T where T: TextSource + LinkSource + ImageSource + TableSource + MetadataSource {}

/// Extracts the five artifact categories from one loaded document.
///
/// # Example
///
/// ```no_run
/// use docextract::Extractor;
///
/// let extractor = Extractor::open("report.docx")?;
/// println!("{}", extractor.extract_text()?);
/// for link in extractor.extract_links()? {
///     println!("{}", link.address);
/// }
/// # Ok::<(), docextract::Error>(())
/// ```
pub struct Extractor {
    format: FormatTag,
    document_id: String,
    document: Document,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Extractor {
    /// Wrap a loaded document.
    pub fn new(document: Document, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            format: document.format(),
            document_id: document.path().display().to_string(),
            document,
            diagnostics,
        }
    }

    /// Load `path` with the loader its extension selects, logging diagnostics.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, default_diagnostics())
    }

    /// Load `path`, reporting to `diagnostics`.
    pub fn open_with<P: AsRef<Path>>(path: P, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let loader = Loader::for_path_with(path, diagnostics)?;
        Self::from_loader(&loader)
    }

    /// Load through an existing loader, sharing its diagnostics.
    pub fn from_loader(loader: &Loader) -> Result<Self> {
        let document = loader.load_file()?;
        Ok(Self::new(document, Arc::clone(loader.diagnostics())))
    }

    /// Format of the wrapped document.
    pub fn format(&self) -> FormatTag {
        self.format
    }

    /// Identifier used in diagnostics (the document path).
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// The wrapped document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Diagnostics sink shared with the loader.
    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }

    /// Reporter bound to this document.
    pub fn reporter(&self) -> Reporter<'_> {
        Reporter::new(self.diagnostics.as_ref(), &self.document_id)
    }

    /// Extract the document text.
    pub fn extract_text(&self) -> Result<String> {
        self.extract(Category::Text, |source, reporter| source.text(reporter), |text| {
            usize::from(!text.is_empty())
        })
    }

    /// Extract hyperlinks.
    pub fn extract_links(&self) -> Result<Vec<Link>> {
        self.extract(Category::Links, |source, reporter| source.links(reporter), Vec::len)
    }

    /// Extract embedded pictures.
    pub fn extract_images(&self) -> Result<Vec<ImageBlob>> {
        self.extract(Category::Images, |source, reporter| source.images(reporter), Vec::len)
    }

    /// Extract tables.
    pub fn extract_tables(&self) -> Result<Vec<Table>> {
        self.extract(Category::Tables, |source, reporter| source.tables(reporter), Vec::len)
    }

    /// Extract document properties.
    pub fn extract_metadata(&self) -> Result<Metadata> {
        self.extract(
            Category::Metadata,
            |source, reporter| source.metadata(reporter),
            |metadata| metadata.entries().iter().filter(|(_, v)| v.is_some()).count(),
        )
    }

    fn extract<T>(
        &self,
        category: Category,
        run: impl FnOnce(&dyn ArtifactSource, &Reporter<'_>) -> Result<T>,
        count: impl FnOnce(&T) -> usize,
    ) -> Result<T> {
        let reporter = self.reporter();
        match run(self.document.source(), &reporter) {
            Ok(value) => {
                reporter.ok(Stage::Extract, Some(category), count(&value));
                Ok(value)
            }
            Err(e) => {
                reporter.failed(Stage::Extract, Some(category), &e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("format", &self.format)
            .field("document", &self.document_id)
            .finish_non_exhaustive()
    }
}
