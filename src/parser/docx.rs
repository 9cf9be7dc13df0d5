//! Word documents.

use std::path::{Path, PathBuf};

use crate::diagnostics::{Reporter, Stage};
use crate::error::Result;
use crate::extractor::{ImageSource, LinkSource, MetadataSource, TableSource, TextSource};
use crate::model::{Category, ImageBlob, Link, Metadata, Table};

use super::package::{MediaPart, Package, Relationship};
use super::xml::{XmlElement, XmlNode};

const MAIN_PART: &str = "word/document.xml";

/// Run-level elements whose subtrees never contribute body text.
const SKIPPED_SUBTREES: [&str; 4] = ["pPr", "rPr", "txbxContent", "instrText"];

/// A parsed `.docx` package.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    path: PathBuf,
    paragraphs: Vec<String>,
    tables: Vec<Table>,
    relationships: Vec<Relationship>,
    media: Vec<MediaPart>,
    metadata: Metadata,
}

impl DocxDocument {
    /// Open and parse every part extraction needs.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut package = Package::open(path)?;

        let main_part = package.main_part(MAIN_PART)?;
        let root = package.read_xml(&main_part)?;
        let body = root.child("body");

        let paragraphs: Vec<String> = body
            .map(|b| b.children_named("p").map(paragraph_text).collect())
            .unwrap_or_default();
        let tables: Vec<Table> = body
            .map(|b| b.children_named("tbl").map(parse_table).collect())
            .unwrap_or_default();

        let relationships: Vec<Relationship> =
            package.relationships(&main_part)?.iter().cloned().collect();

        let mut media = Vec::new();
        for rel in relationships.iter().filter(|rel| rel.is_image()) {
            media.push(package.media(&main_part, rel)?);
        }

        let metadata = package.core_properties()?;

        log::debug!(
            "{}: {} paragraphs, {} tables, {} media parts",
            path.display(),
            paragraphs.len(),
            tables.len(),
            media.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            paragraphs,
            tables,
            relationships,
            media,
            metadata,
        })
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Body paragraph texts in document order.
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Relationships of the main document part.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }
}

/// Text of a `w:p`: runs' `w:t` content, tabs and breaks, in order.
fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut out = String::new();
    collect_run_text(paragraph, &mut out);
    out
}

fn collect_run_text(el: &XmlElement, out: &mut String) {
    for node in &el.children {
        let XmlNode::Element(child) = node else {
            continue;
        };
        match child.name.as_str() {
            "t" => out.push_str(&child.text()),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            name if SKIPPED_SUBTREES.contains(&name) => {}
            _ => collect_run_text(child, out),
        }
    }
}

/// `w:tbl` rows x cells; a cell's text is its paragraphs joined with newlines.
fn parse_table(tbl: &XmlElement) -> Table {
    let mut table = Table::new();
    for tr in tbl.children_named("tr") {
        let row = tr
            .children_named("tc")
            .map(|tc| {
                tc.children_named("p")
                    .map(paragraph_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect();
        table.add_row(row);
    }
    table
}

impl TextSource for DocxDocument {
    fn text(&self, _reporter: &Reporter<'_>) -> Result<String> {
        Ok(self.paragraphs.join("\n"))
    }
}

impl LinkSource for DocxDocument {
    fn links(&self, _reporter: &Reporter<'_>) -> Result<Vec<Link>> {
        Ok(self
            .relationships
            .iter()
            .filter(|rel| rel.is_hyperlink())
            .map(|rel| Link::new(rel.target.clone()))
            .collect())
    }
}

impl ImageSource for DocxDocument {
    fn images(&self, reporter: &Reporter<'_>) -> Result<Vec<ImageBlob>> {
        let mut images = Vec::new();
        for (i, part) in self.media.iter().enumerate() {
            match &part.data {
                Some(data) => images.push(ImageBlob::new(data.clone()).with_name(part.name.clone())),
                None => reporter.skipped(
                    Stage::Extract,
                    Some(Category::Images),
                    i + 1,
                    format!("missing part {}", part.name),
                ),
            }
        }
        Ok(images)
    }
}

impl TableSource for DocxDocument {
    fn tables(&self, _reporter: &Reporter<'_>) -> Result<Vec<Table>> {
        Ok(self.tables.clone())
    }
}

impl MetadataSource for DocxDocument {
    fn metadata(&self, _reporter: &Reporter<'_>) -> Result<Metadata> {
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::xml;

    #[test]
    fn test_paragraph_text_runs_tabs_breaks() {
        let p = xml::parse(
            r#"<w:p xmlns:w="urn:w">
  <w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
  <w:r><w:rPr><w:b/></w:rPr><w:t>Total</w:t></w:r>
  <w:r><w:tab/><w:t xml:space="preserve">42 </w:t><w:br/><w:t>units</w:t></w:r>
  <w:hyperlink r:id="rId4" xmlns:r="urn:r"><w:r><w:t>link</w:t></w:r></w:hyperlink>
</w:p>"#,
        )
        .unwrap();
        assert_eq!(paragraph_text(&p), "Total\t42 \nunitslink");
    }

    #[test]
    fn test_text_box_content_is_skipped() {
        let p = xml::parse(
            r#"<w:p xmlns:w="urn:w"><w:r><w:t>Body</w:t>
<w:pict><v:textbox xmlns:v="urn:v"><w:txbxContent><w:p><w:r><w:t>Boxed</w:t></w:r></w:p></w:txbxContent></v:textbox></w:pict>
</w:r></w:p>"#,
        )
        .unwrap();
        assert_eq!(paragraph_text(&p), "Body");
    }

    #[test]
    fn test_parse_table_keeps_empty_cells() {
        let tbl = xml::parse(
            r#"<w:tbl xmlns:w="urn:w">
  <w:tblPr/>
  <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>
  <w:tr><w:tc><w:p><w:r><w:t>c</w:t></w:r></w:p><w:p><w:r><w:t>d</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>"#,
        )
        .unwrap();
        let table = parse_table(&tbl);
        assert_eq!(
            table.rows,
            vec![
                vec!["a".to_string(), String::new()],
                vec!["c\nd".to_string()],
            ]
        );
    }
}
