//! Format parsers.
//!
//! Each format module turns a file into a document handle and implements
//! the extraction capability traits on it. The remaining modules are shared
//! building blocks: an XML element tree and OOXML package access for DOCX
//! and PPTX, positioned text spans and table detection for PDF.

pub mod docx;
pub mod layout;
pub mod package;
pub mod pdf;
pub mod pptx;
pub mod table_detector;
pub mod xml;

pub use docx::DocxDocument;
pub use layout::TextSpan;
pub use pdf::PdfDocument;
pub use pptx::{PptxDocument, Shape, Slide};
pub use table_detector::{TableDetector, TableDetectorConfig};
