//! Table detection from text positions (stream mode).
//!
//! PDFs rarely carry table structure. Tables are recovered by grouping
//! spans into rows by baseline and finding X positions where text starts in
//! enough rows to count as a column edge.

use std::collections::{HashMap, HashSet};

use crate::model::Table;

use super::layout::TextSpan;

/// A row of spans sharing a baseline.
#[derive(Debug, Clone)]
struct SpanRow {
    spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum share of rows an edge must appear in (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
    /// Width of the X buckets edges are counted in (points)
    pub bucket_size: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            bucket_size: 5.0,
        }
    }
}

/// Detects tables in a page's text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans, top of page first.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<Table> {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            return Vec::new();
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        if columns.len() < self.config.min_columns {
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let region = &rows[start..=end];

            // Columns of the region itself, not of the whole page.
            let region_columns = self.detect_columns(region);
            if region_columns.len() < self.config.min_columns {
                continue;
            }
            if is_list_pattern(region, &region_columns) {
                log::debug!("table detector: skipping list-like region of {} rows", region.len());
                continue;
            }

            tables.push(self.to_table(region, &region_columns));
        }

        log::debug!("table detector: {} spans, {} tables", spans.len(), tables.len());
        tables
    }

    /// Group spans into rows, top to bottom, each row sorted by X.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<SpanRow> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut rows: Vec<SpanRow> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(SpanRow {
                            spans: std::mem::take(&mut current),
                        });
                    }
                    current_y = Some(span.y);
                    current.push(span);
                }
            }
        }
        if !current.is_empty() {
            rows.push(SpanRow { spans: current });
        }

        rows
    }

    /// Column edges: left edges recurring across rows, merged when closer than the minimum gap.
    fn detect_columns(&self, rows: &[SpanRow]) -> Vec<f32> {
        let multi_span_rows: Vec<&SpanRow> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let considered: Vec<&SpanRow> = if multi_span_rows.len() >= self.config.min_rows {
            multi_span_rows
        } else {
            rows.iter().collect()
        };
        if considered.is_empty() {
            return Vec::new();
        }

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &considered {
            // Each bucket counts once per row.
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|span| (span.x / self.config.bucket_size).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((considered.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * self.config.bucket_size)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Runs of consecutive rows aligned with the column edges.
    fn find_table_regions(&self, rows: &[SpanRow], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns, self.config.bucket_size) >= self.config.min_alignment_ratio {
                if start.is_none() {
                    start = Some(i);
                }
                continue;
            }
            if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Build the table: every row gets one cell per column, each span going to its nearest column.
    fn to_table(&self, rows: &[SpanRow], columns: &[f32]) -> Table {
        let mut table = Table::new();

        for row in rows {
            let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for span in &row.spans {
                let col = nearest_column(span.x, columns);
                cells[col].push(span.text.trim());
            }
            table.add_row(cells.into_iter().map(|parts| parts.join(" ")).collect());
        }

        table
    }
}

/// Share of a row's spans that start on a column edge.
fn alignment_score(row: &SpanRow, columns: &[f32], tolerance: f32) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= tolerance))
        .count();
    aligned as f32 / row.spans.len() as f32
}

fn nearest_column(x: f32, columns: &[f32]) -> usize {
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Numbered or bulleted lists split into marker and text spans look like two-column tables.
fn is_list_pattern(rows: &[SpanRow], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let mut bullets = 0;
    let mut numbers = 0;
    for row in rows {
        // Rows are sorted by X, so the first span is the leftmost.
        if let Some(first) = row.spans.first() {
            let text = first.text.trim();
            if is_bullet_marker(text) {
                bullets += 1;
            } else if is_number_marker(text) {
                numbers += 1;
            }
        }
    }

    let bullet_ratio = bullets as f32 / rows.len() as f32;
    let marker_ratio = (bullets + numbers) as f32 / rows.len() as f32;

    bullet_ratio >= 0.5 || (columns.len() == 2 && marker_ratio >= 0.5)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text,
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// "1.", "12)", "3", "a.", "B)"
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    let digits = cleaned.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = &cleaned[digits..];
    if digits > 0 && (rest.is_empty() || rest == "." || rest == ")") {
        return true;
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some('.' | ')'), None) if letter.is_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, 12.0)
    }

    #[test]
    fn test_group_into_rows() {
        let detector = TableDetector::new();
        let rows = detector.group_into_rows(&[
            span("B1", 60.0, 100.0),
            span("A2", 10.0, 85.0),
            span("A1", 10.0, 101.0),
            span("B2", 60.0, 85.0),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spans[0].text, "A1");
        assert_eq!(rows[0].spans[1].text, "B1");
    }

    #[test]
    fn test_detect_simple_table() {
        let detector = TableDetector::new();
        let tables = detector.detect(&[
            span("Name", 10.0, 100.0),
            span("Age", 60.0, 100.0),
            span("Alice", 10.0, 85.0),
            span("30", 60.0, 85.0),
            span("Bob", 10.0, 70.0),
            span("25", 60.0, 70.0),
        ]);

        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            Table::from([["Name", "Age"], ["Alice", "30"], ["Bob", "25"]])
        );
    }

    #[test]
    fn test_missing_cell_is_empty_string() {
        let detector = TableDetector::new();
        let tables = detector.detect(&[
            span("k", 10.0, 100.0),
            span("v", 60.0, 100.0),
            span("x", 10.0, 85.0),
            span("y", 60.0, 85.0),
            span("z", 10.0, 70.0),
        ]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[2], vec!["z".to_string(), String::new()]);
    }

    #[test]
    fn test_single_column_is_not_a_table() {
        let detector = TableDetector::new();
        let tables = detector.detect(&[
            span("Line 1", 10.0, 100.0),
            span("Line 2", 10.0, 85.0),
            span("Line 3", 10.0, 70.0),
        ]);
        assert!(tables.is_empty());
    }

    #[test]
    fn test_lists_are_not_tables() {
        let detector = TableDetector::new();
        let numbered = [
            span("1.", 50.0, 400.0),
            span("Install", 80.0, 400.0),
            span("2.", 50.0, 370.0),
            span("Configure", 80.0, 370.0),
            span("3.", 50.0, 340.0),
            span("Run", 80.0, 340.0),
        ];
        assert!(detector.detect(&numbered).is_empty());

        let bulleted = [
            span("•", 50.0, 400.0),
            span("Management", 80.0, 400.0),
            span("•", 50.0, 370.0),
            span("Firmware", 80.0, 370.0),
        ];
        assert!(detector.detect(&bulleted).is_empty());
    }

    #[test]
    fn test_markers() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12)"));
        assert!(is_number_marker("3"));
        assert!(is_number_marker("b)"));
        assert!(!is_number_marker("Name"));
        assert!(!is_number_marker("1.5"));
        assert!(is_bullet_marker("•"));
        assert!(!is_bullet_marker("Alice"));
    }
}
