//! Persistence sinks.
//!
//! A sink pulls each artifact category from an [`Extractor`] and stores it
//! tagged with the document's format. Categories are saved independently:
//! [`Sink::save_all`] keeps going after a failed category and reports every
//! outcome in a [`SaveReport`].

mod filesystem;
mod relational;

pub use filesystem::FilesystemSink;
pub use relational::RelationalSink;

use image::ImageFormat;

use crate::diagnostics::{Diagnostics, Reporter, Stage};
use crate::error::{Error, Result};
use crate::extractor::Extractor;
use crate::model::{Category, ImageBlob};

/// A persistence backend.
pub trait Sink {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Diagnostics the sink reports to.
    fn diagnostics(&self) -> &dyn Diagnostics;

    /// Persist the document text.
    fn save_text(&mut self, extractor: &Extractor) -> Result<()>;

    /// Persist link addresses.
    fn save_links(&mut self, extractor: &Extractor) -> Result<()>;

    /// Persist every decodable image; returns how many were stored.
    fn save_images(&mut self, extractor: &Extractor) -> Result<usize>;

    /// Persist tables.
    fn save_tables(&mut self, extractor: &Extractor) -> Result<()>;

    /// Persist metadata entries.
    fn save_metadata(&mut self, extractor: &Extractor) -> Result<()>;

    /// Persist one category, reporting a failure to diagnostics.
    fn save(&mut self, category: Category, extractor: &Extractor) -> Result<()> {
        let result = match category {
            Category::Text => self.save_text(extractor),
            Category::Links => self.save_links(extractor),
            Category::Images => self.save_images(extractor).map(|_| ()),
            Category::Tables => self.save_tables(extractor),
            Category::Metadata => self.save_metadata(extractor),
        };

        if let Err(e) = &result {
            Reporter::new(self.diagnostics(), extractor.document_id()).failed(
                Stage::Persist,
                Some(category),
                e,
            );
        }
        result
    }

    /// Persist all five categories; one failing never stops the others.
    fn save_all(&mut self, extractor: &Extractor) -> SaveReport {
        let mut report = SaveReport::new(self.name());
        for category in Category::ALL {
            let result = self.save(category, extractor);
            report.results.push((category, result));
        }
        report
    }
}

/// Per-category outcome of [`Sink::save_all`].
#[derive(Debug)]
pub struct SaveReport {
    sink: &'static str,
    results: Vec<(Category, Result<()>)>,
}

impl SaveReport {
    fn new(sink: &'static str) -> Self {
        Self {
            sink,
            results: Vec::with_capacity(Category::ALL.len()),
        }
    }

    /// Name of the sink that produced the report.
    pub fn sink(&self) -> &'static str {
        self.sink
    }

    /// Outcome per category, in save order.
    pub fn results(&self) -> &[(Category, Result<()>)] {
        &self.results
    }

    /// Categories that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (Category, &Error)> {
        self.results
            .iter()
            .filter_map(|(category, result)| result.as_ref().err().map(|e| (*category, e)))
    }

    /// Whether every category was saved.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }
}

/// Settle a category whose items were written one at a time.
///
/// Failed items (1-based) are reported as skipped and the rest stay stored.
/// When nothing was stored the first failure fails the whole category.
pub(crate) fn settle_items<E>(
    reporter: &Reporter<'_>,
    category: Category,
    written: usize,
    mut failed: Vec<(usize, E)>,
) -> Result<usize>
where
    E: Into<Error> + std::fmt::Display,
{
    if written == 0 && !failed.is_empty() {
        let (_, first) = failed.swap_remove(0);
        return Err(first.into());
    }
    for (item, e) in failed {
        reporter.skipped(Stage::Persist, Some(category), item, e);
    }
    reporter.ok(Stage::Persist, Some(category), written);
    Ok(written)
}

/// An image that passed the decode check.
pub(crate) struct CheckedImage {
    /// 1-based position in the extracted collection
    pub index: usize,
    pub blob: ImageBlob,
    pub format: ImageFormat,
}

/// Extract images and keep those that decode; the rest are reported as skipped.
pub(crate) fn checked_images(extractor: &Extractor, reporter: &Reporter<'_>) -> Result<Vec<CheckedImage>> {
    let mut checked = Vec::new();
    for (i, blob) in extractor.extract_images()?.into_iter().enumerate() {
        match blob.decode_format() {
            Ok(format) => checked.push(CheckedImage {
                index: i + 1,
                blob,
                format,
            }),
            Err(e) => reporter.skipped(Stage::Persist, Some(Category::Images), i + 1, e),
        }
    }
    Ok(checked)
}
