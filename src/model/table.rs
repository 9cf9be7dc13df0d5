//! Table grids.

use serde::{Deserialize, Serialize};

/// A table as an ordered grid of cell strings.
///
/// Rows may have different lengths; nothing pads or truncates them. A cell
/// with no content is the empty string, never omitted, so column positions
/// survive extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    /// Rows of cells
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize as rows joined by newlines and cells joined by commas.
    ///
    /// This is the relational store's text blob format. No quoting is applied.
    pub fn to_delimited(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Vec<String>>> for Table {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

impl<const R: usize, const C: usize> From<[[&str; C]; R]> for Table {
    fn from(grid: [[&str; C]; R]) -> Self {
        Self {
            rows: grid
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }
}
