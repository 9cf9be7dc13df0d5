//! Document properties.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys every format reports, in persistence order.
pub const METADATA_KEYS: [&str; 6] = ["title", "author", "subject", "keywords", "created", "modified"];

/// Document metadata.
///
/// The fixed keys are shared by all formats. PDF documents may carry any
/// number of producer-defined entries besides those, kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creation date
    pub created: Option<String>,

    /// Last modification date
    pub modified: Option<String>,

    /// Producer-defined entries (PDF Info dictionary keys beyond the fixed set)
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a fixed key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "title" => self.title.as_deref(),
            "author" => self.author.as_deref(),
            "subject" => self.subject.as_deref(),
            "keywords" => self.keywords.as_deref(),
            "created" => self.created.as_deref(),
            "modified" => self.modified.as_deref(),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    /// All entries as key/value pairs: fixed keys first, then `extra` in key order.
    ///
    /// Fixed keys are always present, with `None` when the document has no value.
    pub fn entries(&self) -> Vec<(String, Option<String>)> {
        let mut entries: Vec<(String, Option<String>)> = METADATA_KEYS
            .iter()
            .map(|key| (key.to_string(), self.get(key).map(str::to_string)))
            .collect();

        entries.extend(
            self.extra
                .iter()
                .map(|(key, value)| (key.clone(), Some(value.clone()))),
        );

        entries
    }

    /// Check if no value is set.
    pub fn is_empty(&self) -> bool {
        METADATA_KEYS.iter().all(|key| self.get(key).is_none()) && self.extra.is_empty()
    }
}
