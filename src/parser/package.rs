//! Office Open XML packages: ZIP parts, relationships and core properties.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::model::Metadata;

use super::xml::{self, XmlElement};

const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const CORE_PROPERTIES_REL: &str = "/core-properties";

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id (`rId3`)
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target as written in the part
    pub target: String,
    /// Whether the target lives outside the package (`TargetMode="External"`)
    pub external: bool,
}

impl Relationship {
    /// Hyperlink relationship.
    pub fn is_hyperlink(&self) -> bool {
        self.rel_type.ends_with("/hyperlink")
    }

    /// Embedded picture: image-typed, or an internal target under an image path.
    pub fn is_image(&self) -> bool {
        !self.external && (self.rel_type.ends_with("/image") || self.target.contains("image"))
    }
}

/// Relationships of one part, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = xml::parse(xml)?;
        let entries = root
            .children_named("Relationship")
            .filter_map(|el| {
                Some(Relationship {
                    id: el.attr("Id")?.to_string(),
                    rel_type: el.attr("Type").unwrap_or_default().to_string(),
                    target: el.attr("Target")?.to_string(),
                    external: el
                        .attr("TargetMode")
                        .is_some_and(|mode| mode.eq_ignore_ascii_case("external")),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    /// Relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// First relationship whose type ends with `suffix`.
    pub fn by_type(&self, suffix: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.rel_type.ends_with(suffix))
    }

    /// All relationships.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }
}

/// Bytes of an embedded part, or `None` when the part the relationship names is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPart {
    /// Part name inside the package (`word/media/image1.png`)
    pub name: String,
    /// Part content
    pub data: Option<Vec<u8>>,
}

/// An opened package.
pub struct Package {
    archive: ZipArchive<BufReader<File>>,
}

impl Package {
    /// Open the ZIP container at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let archive = ZipArchive::new(BufReader::new(file))?;
        Ok(Self { archive })
    }

    /// Raw content of a part.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut part = match self.archive.by_name(name.trim_start_matches('/')) {
            Ok(part) => part,
            Err(ZipError::FileNotFound) => return Err(Error::MissingPart(name.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::with_capacity(part.size() as usize);
        part.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Content of a part, `None` if the package has no such part.
    pub fn read_optional(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.read(name) {
            Ok(data) => Ok(Some(data)),
            Err(Error::MissingPart(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Parse a part as XML.
    pub fn read_xml(&mut self, name: &str) -> Result<XmlElement> {
        let data = self.read(name)?;
        xml::parse(&String::from_utf8_lossy(&data))
    }

    /// Relationships of `part` (empty if it has no `.rels` part). `""` names the package itself.
    pub fn relationships(&mut self, part: &str) -> Result<Relationships> {
        match self.read_optional(&rels_part_name(part))? {
            Some(data) => Relationships::parse(&String::from_utf8_lossy(&data)),
            None => Ok(Relationships::default()),
        }
    }

    /// Name of the main document part, falling back to `default`.
    pub fn main_part(&mut self, default: &str) -> Result<String> {
        let rels = self.relationships("")?;
        Ok(rels
            .by_type(OFFICE_DOCUMENT_REL)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| default.to_string()))
    }

    /// Load the internal target of an image relationship of `part`.
    pub fn media(&mut self, part: &str, rel: &Relationship) -> Result<MediaPart> {
        let name = resolve_target(part, &rel.target);
        let data = self.read_optional(&name)?;
        Ok(MediaPart { name, data })
    }

    /// Document properties from the core-properties part.
    ///
    /// Packages without one yield empty metadata.
    pub fn core_properties(&mut self) -> Result<Metadata> {
        let rels = self.relationships("")?;
        let name = rels
            .by_type(CORE_PROPERTIES_REL)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| "docProps/core.xml".to_string());

        match self.read_optional(&name)? {
            Some(data) => Ok(parse_core_properties(&xml::parse(&String::from_utf8_lossy(&data))?)),
            None => Ok(Metadata::new()),
        }
    }
}

/// Map core-properties elements onto the fixed metadata keys.
pub fn parse_core_properties(root: &XmlElement) -> Metadata {
    let field = |name: &str| {
        root.child(name)
            .map(|el| el.text().trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Metadata {
        title: field("title"),
        author: field("creator"),
        subject: field("subject"),
        keywords: field("keywords"),
        created: field("created"),
        modified: field("modified"),
        ..Metadata::default()
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`; `""` -> `_rels/.rels`.
fn rels_part_name(part: &str) -> String {
    let part = part.trim_start_matches('/');
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it.
///
/// Absolute targets (`/word/media/a.png`) are package-rooted; relative
/// ones are joined to the source part's directory with `.` and `..` folded.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    if !target.starts_with('/') {
        if let Some((dir, _)) = source_part.trim_start_matches('/').rsplit_once('/') {
            segments.extend(dir.split('/').filter(|s| !s.is_empty()));
        }
    }

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_part_name() {
        assert_eq!(rels_part_name("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_part_name("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_part_name(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/document.xml", "media/image1.png"), "word/media/image1.png");
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../media/image2.jpeg"),
            "ppt/media/image2.jpeg"
        );
        assert_eq!(resolve_target("ppt/slides/slide1.xml", "/ppt/media/x.png"), "ppt/media/x.png");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_target("ppt/presentation.xml", "./slides/slide3.xml"), "ppt/slides/slide3.xml");
    }

    #[test]
    fn test_parse_relationships() {
        let rels = Relationships::parse(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/a?b=1&amp;c=2" TargetMode="External"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
        )
        .unwrap();

        let link = rels.get("rId1").unwrap();
        assert!(link.is_hyperlink() && link.external && !link.is_image());
        assert_eq!(link.target, "https://example.com/a?b=1&c=2");

        assert!(rels.get("rId2").unwrap().is_image());
        assert!(!rels.get("rId3").unwrap().is_image());
        assert_eq!(rels.iter().count(), 3);
        assert!(rels.get("rId9").is_none());
    }

    #[test]
    fn test_parse_core_properties() {
        let root = xml::parse(
            r#"<cp:coreProperties xmlns:cp="urn:cp" xmlns:dc="urn:dc" xmlns:dcterms="urn:dcterms">
  <dc:title>Quarterly Report</dc:title>
  <dc:creator>Finance Team</dc:creator>
  <cp:keywords></cp:keywords>
  <dcterms:created>2024-01-15T09:30:00Z</dcterms:created>
</cp:coreProperties>"#,
        )
        .unwrap();

        let metadata = parse_core_properties(&root);
        assert_eq!(metadata.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(metadata.author.as_deref(), Some("Finance Team"));
        assert_eq!(metadata.keywords, None);
        assert_eq!(metadata.created.as_deref(), Some("2024-01-15T09:30:00Z"));
        assert_eq!(metadata.modified, None);
    }
}
