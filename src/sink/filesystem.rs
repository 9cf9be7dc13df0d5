//! Directory-tree sink: one subdirectory per artifact category.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, Reporter, Stage};
use crate::error::Result;
use crate::extractor::Extractor;
use crate::format::FormatTag;
use crate::model::{Category, ImageBlob, Table};

use super::{checked_images, settle_items, Sink};

/// Writes artifacts as plain files under a base directory.
///
/// ```text
/// base/
///   text/{fmt}_text.txt
///   links/{fmt}_links.txt
///   images/{fmt}_image_{n}.{ext}
///   tables/{fmt}_{n}.csv
///   metadata/{fmt}_metadata.txt
/// ```
///
/// Files for one format overwrite the previous run's files for that format.
pub struct FilesystemSink {
    base: PathBuf,
    diagnostics: Arc<dyn Diagnostics>,
}

impl FilesystemSink {
    /// Create the sink, making sure every category directory exists.
    ///
    /// Existing directories and their contents are left alone.
    pub fn new(base: impl Into<PathBuf>, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let sink = Self {
            base: base.into(),
            diagnostics,
        };
        sink.ensure_directories()?;
        Ok(sink)
    }

    fn ensure_directories(&self) -> Result<()> {
        for category in Category::ALL {
            fs::create_dir_all(self.category_dir(category))?;
        }
        Ok(())
    }

    /// Base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Directory holding one category.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.base.join(category.as_str())
    }

    /// Path of the text file for `format`.
    pub fn text_path(&self, format: FormatTag) -> PathBuf {
        self.category_dir(Category::Text)
            .join(format!("{}_text.txt", format))
    }

    /// Path of the link list for `format`.
    pub fn links_path(&self, format: FormatTag) -> PathBuf {
        self.category_dir(Category::Links)
            .join(format!("{}_links.txt", format))
    }

    /// Path of image `index` (1-based) with extension `ext`.
    pub fn image_path(&self, format: FormatTag, index: usize, ext: &str) -> PathBuf {
        self.category_dir(Category::Images)
            .join(format!("{}_image_{}.{}", format, index, ext))
    }

    /// Path of table `index` (1-based).
    pub fn table_path(&self, format: FormatTag, index: usize) -> PathBuf {
        self.category_dir(Category::Tables)
            .join(format!("{}_{}.csv", format, index))
    }

    /// Path of the metadata file for `format`.
    pub fn metadata_path(&self, format: FormatTag) -> PathBuf {
        self.category_dir(Category::Metadata)
            .join(format!("{}_metadata.txt", format))
    }

    fn reporter<'a>(&'a self, extractor: &'a Extractor) -> Reporter<'a> {
        Reporter::new(self.diagnostics.as_ref(), extractor.document_id())
    }
}

impl Sink for FilesystemSink {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    fn save_text(&mut self, extractor: &Extractor) -> Result<()> {
        let text = extractor.extract_text()?;
        fs::write(self.text_path(extractor.format()), &text)?;
        self.reporter(extractor)
            .ok(Stage::Persist, Some(Category::Text), usize::from(!text.is_empty()));
        Ok(())
    }

    fn save_links(&mut self, extractor: &Extractor) -> Result<()> {
        let links = extractor.extract_links()?;
        let mut out = BufWriter::new(File::create(self.links_path(extractor.format()))?);
        for link in &links {
            writeln!(out, "{}", link.address)?;
        }
        out.flush()?;

        self.reporter(extractor)
            .ok(Stage::Persist, Some(Category::Links), links.len());
        Ok(())
    }

    fn save_images(&mut self, extractor: &Extractor) -> Result<usize> {
        let reporter = self.reporter(extractor);
        let images = checked_images(extractor, &reporter)?;

        let mut written = 0;
        let mut failed = Vec::new();
        for image in &images {
            let path = self.image_path(
                extractor.format(),
                image.index,
                ImageBlob::extension(image.format),
            );
            match fs::write(path, &image.blob.data) {
                Ok(()) => written += 1,
                Err(e) => failed.push((image.index, e)),
            }
        }

        settle_items(&reporter, Category::Images, written, failed)
    }

    fn save_tables(&mut self, extractor: &Extractor) -> Result<()> {
        let tables = extractor.extract_tables()?;

        let mut written = 0;
        let mut failed = Vec::new();
        for (i, table) in tables.iter().enumerate() {
            match write_csv(&self.table_path(extractor.format(), i + 1), table) {
                Ok(()) => written += 1,
                Err(e) => failed.push((i + 1, e)),
            }
        }

        settle_items(&self.reporter(extractor), Category::Tables, written, failed)?;
        Ok(())
    }

    fn save_metadata(&mut self, extractor: &Extractor) -> Result<()> {
        let entries = extractor.extract_metadata()?.entries();
        let mut out = BufWriter::new(File::create(self.metadata_path(extractor.format()))?);
        for (key, value) in &entries {
            writeln!(out, "{}: {}", key, value.as_deref().unwrap_or("None"))?;
        }
        out.flush()?;

        self.reporter(extractor)
            .ok(Stage::Persist, Some(Category::Metadata), entries.len());
        Ok(())
    }
}

/// Write one table as CSV. Rows keep their own length; no padding.
fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

impl std::fmt::Debug for FilesystemSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemSink")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemoryDiagnostics;

    #[test]
    fn test_creates_category_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FilesystemSink::new(dir.path().join("out"), Arc::new(MemoryDiagnostics::new())).unwrap();

        for category in Category::ALL {
            assert!(sink.category_dir(category).is_dir(), "{} missing", category);
        }
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let diagnostics: Arc<dyn Diagnostics> = Arc::new(MemoryDiagnostics::new());
        let first = FilesystemSink::new(dir.path(), Arc::clone(&diagnostics)).unwrap();
        let keep = first.text_path(FormatTag::Pdf);
        fs::write(&keep, "earlier run").unwrap();

        let second = FilesystemSink::new(dir.path(), diagnostics).unwrap();
        assert_eq!(second.base_dir(), dir.path());
        assert_eq!(fs::read_to_string(&keep).unwrap(), "earlier run");
    }

    #[test]
    fn test_paths() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FilesystemSink::new(dir.path(), Arc::new(MemoryDiagnostics::new())).unwrap();
        let base = dir.path().to_path_buf();

        assert_eq!(sink.text_path(FormatTag::Docx), base.join("text/docx_text.txt"));
        assert_eq!(sink.links_path(FormatTag::Pdf), base.join("links/pdf_links.txt"));
        assert_eq!(
            sink.image_path(FormatTag::Pptx, 3, "png"),
            base.join("images/pptx_image_3.png")
        );
        assert_eq!(sink.table_path(FormatTag::Docx, 1), base.join("tables/docx_1.csv"));
        assert_eq!(
            sink.metadata_path(FormatTag::Pdf),
            base.join("metadata/pdf_metadata.txt")
        );
    }
}
