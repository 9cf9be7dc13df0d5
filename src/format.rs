//! Document format tags and extension-based dispatch.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Discriminator identifying which document format an artifact came from.
///
/// The tag is derived once from the file extension when a loader is built
/// and is then carried as a plain value by the extractor and every sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// Portable Document Format
    Pdf,
    /// Word document (Office Open XML)
    Docx,
    /// PowerPoint presentation (Office Open XML)
    Pptx,
    /// Anything else
    Unknown,
}

impl FormatTag {
    /// All supported formats.
    pub const SUPPORTED: [FormatTag; 3] = [FormatTag::Pdf, FormatTag::Docx, FormatTag::Pptx];

    /// Derive the tag from a file extension (without the leading dot).
    ///
    /// Matching is case-insensitive.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => FormatTag::Pdf,
            "docx" => FormatTag::Docx,
            "pptx" => FormatTag::Pptx,
            _ => FormatTag::Unknown,
        }
    }

    /// Derive the tag from a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(FormatTag::Unknown)
    }

    /// Lowercase name used in file names and the `file_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Pdf => "pdf",
            FormatTag::Docx => "docx",
            FormatTag::Pptx => "pptx",
            FormatTag::Unknown => "unknown",
        }
    }

    /// The file extension a path must carry for this format.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            FormatTag::Unknown => None,
            other => Some(other.as_str()),
        }
    }

    /// Whether the format has a loader.
    pub fn is_supported(&self) -> bool {
        !matches!(self, FormatTag::Unknown)
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether `path` carries the extension of `format`.
pub fn has_extension<P: AsRef<Path>>(path: P, format: FormatTag) -> bool {
    format.is_supported() && FormatTag::from_path(path) == format
}
