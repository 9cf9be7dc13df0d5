//! Error types for docextract.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docextract operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, extracting or persisting documents.
#[derive(Error, Debug)]
pub enum Error {
    /// The path does not match the loader's extension or does not exist.
    #[error("Invalid file {}: {reason}", path.display())]
    Validation {
        /// Offending path
        path: PathBuf,
        /// Why validation failed
        reason: String,
    },

    /// The document could not be loaded and no fallback was viable.
    #[error("Failed to load {}: {reason}", path.display())]
    Extraction {
        /// Document path
        path: PathBuf,
        /// Why loading failed
        reason: String,
    },

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading the PDF object model.
    #[error("PDF parsing error: {0}")]
    Pdf(String),

    /// Error from the layout-aware PDF text extractor.
    #[error("PDF text extraction error: {0}")]
    PdfText(String),

    /// The Office Open XML package (ZIP container) is unreadable.
    #[error("Package error: {0}")]
    Package(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A required package part is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Image data could not be identified or decoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Error writing CSV output.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error talking to the relational store.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// OCR rasterization or recognition failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a validation error for `path`.
    pub fn validation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build an extraction (load) error for `path`.
    pub fn extraction(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Extraction {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error ends processing of the affected document.
    ///
    /// Terminal errors are raised before any artifact is extracted; callers
    /// skip the document but may continue with the next one in a batch.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::Extraction { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::PdfText(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("report.txt", "unsupported extension");
        assert_eq!(
            err.to_string(),
            "Invalid file report.txt: unsupported extension"
        );

        let err = Error::MissingPart("word/document.xml".into());
        assert_eq!(err.to_string(), "Missing package part: word/document.xml");
    }

    #[test]
    fn test_terminal_errors() {
        assert!(Error::validation("a.pdf", "missing").is_terminal());
        assert!(Error::extraction("a.pdf", "no text").is_terminal());
        assert!(!Error::Ocr("tesseract not found".into()).is_terminal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
