//! Artifact types shared by every document format.
//!
//! Loaders produce these types and sinks consume them; nothing in this
//! module knows which format an artifact came from.

mod image;
mod link;
mod metadata;
mod table;

pub use image::ImageBlob;
pub use link::Link;
pub use metadata::{Metadata, METADATA_KEYS};
pub use table::Table;

use serde::{Deserialize, Serialize};

/// The five artifact categories every format can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Plain text
    Text,
    /// Hyperlinks
    Links,
    /// Embedded pictures
    Images,
    /// Tables
    Tables,
    /// Document properties
    Metadata,
}

impl Category {
    /// All categories, in the order sinks persist them.
    pub const ALL: [Category; 5] = [
        Category::Text,
        Category::Links,
        Category::Images,
        Category::Tables,
        Category::Metadata,
    ];

    /// Lowercase name, also the filesystem sink's directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Links => "links",
            Category::Images => "images",
            Category::Tables => "tables",
            Category::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
