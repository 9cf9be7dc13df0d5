//! Structured diagnostics for loaders, extractors and sinks.
//!
//! Every component receives an `Arc<dyn Diagnostics>` at construction and
//! reports what happened as an [`Event`]: which document, which stage, which
//! artifact category, and the outcome. [`LogDiagnostics`] forwards events to
//! the `log` facade; [`MemoryDiagnostics`] keeps them for inspection.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::model::Category;

/// Processing stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Path validation
    Validate,
    /// Loading the document handle
    Load,
    /// OCR fallback for PDF text
    Ocr,
    /// Extracting an artifact category
    Extract,
    /// Writing an artifact category to a sink
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Load => "load",
            Stage::Ocr => "ocr",
            Stage::Extract => "extract",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    /// The step completed with `items` elements.
    Ok {
        /// Number of elements handled
        items: usize,
    },
    /// One element (1-based `item`) failed and was left out.
    Skipped {
        /// 1-based index of the element within its collection
        item: usize,
        /// Failure description
        reason: String,
    },
    /// The whole step failed.
    Failed {
        /// Failure description
        reason: String,
    },
}

/// One diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Document identifier (its path)
    pub document: String,
    /// Processing stage
    pub stage: Stage,
    /// Artifact category, when the event concerns one
    pub category: Option<Category>,
    /// Outcome
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.document, self.stage)?;
        if let Some(category) = self.category {
            write!(f, " {}", category)?;
        }
        match &self.outcome {
            Outcome::Ok { items } => write!(f, ": ok ({} items)", items),
            Outcome::Skipped { item, reason } => write!(f, ": skipped item {}: {}", item, reason),
            Outcome::Failed { reason } => write!(f, ": failed: {}", reason),
        }
    }
}

/// Receiver of diagnostic events.
pub trait Diagnostics: Send + Sync {
    /// Record one event.
    fn record(&self, event: Event);
}

/// Forwards events to the `log` facade.
///
/// Successes are logged at `info`, skipped items at `warn`, failures at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn record(&self, event: Event) {
        match event.outcome {
            Outcome::Ok { .. } => log::info!("{}", event),
            Outcome::Skipped { .. } => log::warn!("{}", event),
            Outcome::Failed { .. } => log::error!("{}", event),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<Event>>,
}

impl MemoryDiagnostics {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Skipped-item events for `stage` and `category`.
    pub fn skipped(&self, stage: Stage, category: Category) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.stage == stage && e.category == Some(category))
            .filter(|e| matches!(e.outcome, Outcome::Skipped { .. }))
            .collect()
    }

    /// Events whose outcome is `Failed`.
    pub fn failures(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e.outcome, Outcome::Failed { .. }))
            .collect()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn record(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Default diagnostics: the `log` facade.
pub fn default_diagnostics() -> Arc<dyn Diagnostics> {
    Arc::new(LogDiagnostics)
}

/// Event builder bound to one document.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    diagnostics: &'a dyn Diagnostics,
    document: &'a str,
}

impl<'a> Reporter<'a> {
    /// Bind `diagnostics` to `document`.
    pub fn new(diagnostics: &'a dyn Diagnostics, document: &'a str) -> Self {
        Self {
            diagnostics,
            document,
        }
    }

    /// Document identifier events are tagged with.
    pub fn document(&self) -> &str {
        self.document
    }

    fn emit(&self, stage: Stage, category: Option<Category>, outcome: Outcome) {
        self.diagnostics.record(Event {
            document: self.document.to_string(),
            stage,
            category,
            outcome,
        });
    }

    /// Report a completed step.
    pub fn ok(&self, stage: Stage, category: Option<Category>, items: usize) {
        self.emit(stage, category, Outcome::Ok { items });
    }

    /// Report an element that was left out (`item` is 1-based).
    pub fn skipped(
        &self,
        stage: Stage,
        category: Option<Category>,
        item: usize,
        reason: impl std::fmt::Display,
    ) {
        self.emit(
            stage,
            category,
            Outcome::Skipped {
                item,
                reason: reason.to_string(),
            },
        );
    }

    /// Report a failed step.
    pub fn failed(&self, stage: Stage, category: Option<Category>, reason: impl std::fmt::Display) {
        self.emit(
            stage,
            category,
            Outcome::Failed {
                reason: reason.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_diagnostics_records() {
        let diagnostics = MemoryDiagnostics::new();
        let reporter = Reporter::new(&diagnostics, "deck.pptx");

        reporter.ok(Stage::Extract, Some(Category::Images), 3);
        reporter.skipped(Stage::Persist, Some(Category::Images), 2, "unsupported format");
        reporter.failed(Stage::Persist, Some(Category::Tables), "disk full");

        assert_eq!(diagnostics.events().len(), 3);
        assert_eq!(diagnostics.skipped(Stage::Persist, Category::Images).len(), 1);
        assert_eq!(diagnostics.failures().len(), 1);
        assert_eq!(diagnostics.events()[0].document, "deck.pptx");
    }

    #[test]
    fn test_event_display() {
        let event = Event {
            document: "a.pdf".into(),
            stage: Stage::Persist,
            category: Some(Category::Images),
            outcome: Outcome::Skipped {
                item: 2,
                reason: "bad header".into(),
            },
        };
        assert_eq!(event.to_string(), "[a.pdf] persist images: skipped item 2: bad header");
    }
}
