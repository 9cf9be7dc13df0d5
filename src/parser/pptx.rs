//! PowerPoint presentations.

use std::path::{Path, PathBuf};

use crate::diagnostics::{Reporter, Stage};
use crate::error::Result;
use crate::extractor::{ImageSource, LinkSource, MetadataSource, TableSource, TextSource};
use crate::model::{Category, ImageBlob, Link, Metadata, Table};

use super::package::{MediaPart, Package, Relationships};
use super::xml::{XmlElement, XmlNode};

const MAIN_PART: &str = "ppt/presentation.xml";

/// A text run and the address of its click hyperlink, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Run text
    pub text: String,
    /// Resolved hyperlink target
    pub hyperlink: Option<String>,
}

/// A paragraph of a text frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Full paragraph text, including line breaks and field values
    pub text: String,
    /// Text runs (`a:r`) in order
    pub runs: Vec<Run>,
}

/// A top-level shape on a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Auto shape or text box with a text frame
    Text {
        /// Shape name
        name: String,
        /// Paragraphs of the frame
        paragraphs: Vec<Paragraph>,
    },
    /// Picture
    Picture {
        /// Shape name
        name: String,
        /// Embedded image part
        image: MediaPart,
    },
    /// Graphic frame holding a table
    Table {
        /// Shape name
        name: String,
        /// Cell grid
        table: Table,
    },
    /// Anything else (groups, connectors, charts, frames without text)
    Other {
        /// Shape name
        name: String,
    },
}

impl Shape {
    /// Shape name from its non-visual properties.
    pub fn name(&self) -> &str {
        match self {
            Shape::Text { name, .. }
            | Shape::Picture { name, .. }
            | Shape::Table { name, .. }
            | Shape::Other { name } => name,
        }
    }

    /// Text of a text frame: paragraphs joined with newlines.
    pub fn text(&self) -> Option<String> {
        match self {
            Shape::Text { paragraphs, .. } => Some(
                paragraphs
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

/// One slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// Part name (`ppt/slides/slide1.xml`)
    pub part: String,
    /// Top-level shapes in document order
    pub shapes: Vec<Shape>,
}

/// A parsed `.pptx` package.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    path: PathBuf,
    slides: Vec<Slide>,
    metadata: Metadata,
}

impl PptxDocument {
    /// Open and parse every slide in presentation order.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut package = Package::open(path)?;

        let main_part = package.main_part(MAIN_PART)?;
        let presentation = package.read_xml(&main_part)?;
        let presentation_rels = package.relationships(&main_part)?;

        let slide_parts: Vec<String> = presentation
            .child("sldIdLst")
            .map(|list| {
                list.children_named("sldId")
                    .filter_map(|id| id.attr("r:id"))
                    .filter_map(|rid| presentation_rels.get(rid))
                    .map(|rel| super::package::resolve_target(&main_part, &rel.target))
                    .collect()
            })
            .unwrap_or_default();

        let mut slides = Vec::with_capacity(slide_parts.len());
        for part in slide_parts {
            let root = package.read_xml(&part)?;
            let rels = package.relationships(&part)?;
            let shapes = parse_shapes(&mut package, &part, &root, &rels)?;
            slides.push(Slide { part, shapes });
        }

        let metadata = package.core_properties()?;

        log::debug!("{}: {} slides", path.display(), slides.len());

        Ok(Self {
            path: path.to_path_buf(),
            slides,
            metadata,
        })
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.slides.iter().flat_map(|slide| slide.shapes.iter())
    }
}

fn parse_shapes(
    package: &mut Package,
    part: &str,
    root: &XmlElement,
    rels: &Relationships,
) -> Result<Vec<Shape>> {
    let Some(tree) = root.child("cSld").and_then(|c| c.child("spTree")) else {
        return Ok(Vec::new());
    };

    let mut shapes = Vec::new();
    for el in tree.elements() {
        let name = shape_name(el);
        let shape = match el.name.as_str() {
            "sp" => match el.child("txBody") {
                Some(body) => Shape::Text {
                    name,
                    paragraphs: body.children_named("p").map(|p| parse_paragraph(p, rels)).collect(),
                },
                None => Shape::Other { name },
            },
            "pic" => {
                let embed = el.find("blip").and_then(|blip| blip.attr("r:embed"));
                match embed.and_then(|rid| rels.get(rid)) {
                    Some(rel) if !rel.external => Shape::Picture {
                        name,
                        image: package.media(part, rel)?,
                    },
                    // Linked (external) pictures carry no payload.
                    _ => Shape::Other { name },
                }
            }
            "graphicFrame" => match el.find("tbl") {
                Some(tbl) => Shape::Table {
                    name,
                    table: parse_table(tbl),
                },
                None => Shape::Other { name },
            },
            "nvGrpSpPr" | "grpSpPr" | "extLst" => continue,
            _ => Shape::Other { name },
        };
        shapes.push(shape);
    }

    Ok(shapes)
}

fn shape_name(el: &XmlElement) -> String {
    el.elements()
        .find(|child| child.name.starts_with("nv"))
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|props| props.attr("name"))
        .unwrap_or_default()
        .to_string()
}

fn parse_paragraph(p: &XmlElement, rels: &Relationships) -> Paragraph {
    let mut paragraph = Paragraph::default();

    for node in &p.children {
        let XmlNode::Element(child) = node else {
            continue;
        };
        match child.name.as_str() {
            "r" => {
                let text = child.child("t").map(|t| t.text()).unwrap_or_default();
                let hyperlink = child
                    .child("rPr")
                    .and_then(|props| props.child("hlinkClick"))
                    .and_then(|click| click.attr("r:id"))
                    .and_then(|rid| rels.get(rid))
                    .map(|rel| rel.target.clone());
                paragraph.text.push_str(&text);
                paragraph.runs.push(Run { text, hyperlink });
            }
            "br" => paragraph.text.push('\n'),
            "fld" => {
                if let Some(t) = child.child("t") {
                    paragraph.text.push_str(&t.text());
                }
            }
            _ => {}
        }
    }

    paragraph
}

/// `a:tbl` rows x cells; a cell's text is its paragraphs joined with newlines.
fn parse_table(tbl: &XmlElement) -> Table {
    let empty = Relationships::default();
    let mut table = Table::new();
    for tr in tbl.children_named("tr") {
        let row = tr
            .children_named("tc")
            .map(|tc| {
                tc.child("txBody")
                    .map(|body| {
                        body.children_named("p")
                            .map(|p| parse_paragraph(p, &empty).text)
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .unwrap_or_default()
            })
            .collect();
        table.add_row(row);
    }
    table
}

impl TextSource for PptxDocument {
    fn text(&self, _reporter: &Reporter<'_>) -> Result<String> {
        let texts: Vec<String> = self
            .shapes()
            .filter_map(Shape::text)
            .filter(|text| !text.is_empty())
            .collect();
        Ok(texts.join("\n"))
    }
}

impl LinkSource for PptxDocument {
    fn links(&self, _reporter: &Reporter<'_>) -> Result<Vec<Link>> {
        let mut links = Vec::new();
        for shape in self.shapes() {
            let Shape::Text { paragraphs, .. } = shape else {
                continue;
            };
            for run in paragraphs.iter().flat_map(|p| p.runs.iter()) {
                if let Some(address) = &run.hyperlink {
                    links.push(Link::with_text(run.text.clone(), address.clone()));
                }
            }
        }
        Ok(links)
    }
}

impl ImageSource for PptxDocument {
    fn images(&self, reporter: &Reporter<'_>) -> Result<Vec<ImageBlob>> {
        let pictures = self.shapes().filter_map(|shape| match shape {
            Shape::Picture { image, .. } => Some(image),
            _ => None,
        });

        let mut images = Vec::new();
        for (i, part) in pictures.enumerate() {
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

impl TableSource for PptxDocument {
    fn tables(&self, _reporter: &Reporter<'_>) -> Result<Vec<Table>> {
        Ok(self
            .shapes()
            .filter_map(|shape| match shape {
                Shape::Table { table, .. } => Some(table.clone()),
                _ => None,
            })
            .collect())
    }
}

impl MetadataSource for PptxDocument {
    fn metadata(&self, _reporter: &Reporter<'_>) -> Result<Metadata> {
        Ok(self.metadata.clone())
    }
}
