//! Hyperlink records.

use serde::{Deserialize, Serialize};

/// A hyperlink found in a document.
///
/// Every format produces the same shape. Formats that have no display text
/// for a link (PDF annotations, DOCX relationships) leave `text` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Display text, when the format exposes one
    pub text: Option<String>,

    /// Target address
    pub address: String,
}

impl Link {
    /// Create a link with no display text.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            text: None,
            address: address.into(),
        }
    }

    /// Create a link with display text.
    pub fn with_text(text: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            address: address.into(),
        }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address)
    }
}
