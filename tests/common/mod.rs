//! Fixture builders shared by the integration tests.
//!
//! Every document is generated on the fly: OOXML packages with `zip`,
//! PDFs with `lopdf`, pictures with `image`.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docextract::{Error, MemoryDiagnostics, OcrEngine, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub fn diagnostics() -> Arc<MemoryDiagnostics> {
    Arc::new(MemoryDiagnostics::new())
}

// ==================== Images ====================

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([220, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// Starts like a PNG, decodes like nothing.
pub fn corrupt_png() -> Vec<u8> {
    let mut data = png_bytes(4, 4);
    data.truncate(24);
    data
}

// ==================== OOXML ====================

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn write_zip(path: &Path, parts: &[(String, Vec<u8>)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in parts {
        zip.start_file(name.as_str(), options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn rels_xml(entries: &[(String, &str, String, bool)]) -> Vec<u8> {
    let mut xml = format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">"#, PKG_REL_NS);
    for (id, kind, target, external) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"{}/>"#,
            id,
            REL_NS,
            kind,
            escape(target),
            if *external { r#" TargetMode="External""# } else { "" }
        ));
    }
    xml.push_str("</Relationships>");
    xml.into_bytes()
}

fn core_xml(title: &str, author: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"><dc:title>{}</dc:title><dc:creator>{}</dc:creator><dcterms:created>2024-03-01T08:00:00Z</dcterms:created></cp:coreProperties>"#,
        escape(title),
        escape(author)
    )
    .into_bytes()
}

/// Word document builder.
#[derive(Default)]
pub struct DocxFixture {
    body: String,
    links: Vec<String>,
    images: Vec<Vec<u8>>,
    core: Option<(String, String)>,
}

impl DocxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape(text)
        ));
        self
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.body.push_str("<w:tbl>");
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in *row {
                self.body.push_str(&format!(
                    "<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>",
                    escape(cell)
                ));
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    /// Hyperlink relationship plus a paragraph referencing it.
    pub fn link(mut self, text: &str, address: &str) -> Self {
        self.links.push(address.to_string());
        let id = format!("rIdLink{}", self.links.len());
        self.body.push_str(&format!(
            r#"<w:p><w:hyperlink r:id="{}"><w:r><w:t>{}</w:t></w:r></w:hyperlink></w:p>"#,
            id,
            escape(text)
        ));
        self
    }

    pub fn image(mut self, data: Vec<u8>) -> Self {
        self.images.push(data);
        self
    }

    pub fn core(mut self, title: &str, author: &str) -> Self {
        self.core = Some((title.to_string(), author.to_string()));
        self
    }

    pub fn write(self, path: &Path) {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            REL_NS, self.body
        );

        let mut package_rels = vec![(
            "rId1".to_string(),
            "officeDocument",
            "word/document.xml".to_string(),
            false,
        )];
        let mut parts = vec![("word/document.xml".to_string(), document.into_bytes())];

        let mut rels = Vec::new();
        for (i, address) in self.links.iter().enumerate() {
            rels.push((format!("rIdLink{}", i + 1), "hyperlink", address.clone(), true));
        }
        for (i, data) in self.images.into_iter().enumerate() {
            let name = format!("media/image{}.bin", i + 1);
            rels.push((format!("rIdImg{}", i + 1), "image", name.clone(), false));
            parts.push((format!("word/{}", name), data));
        }
        if !rels.is_empty() {
            parts.push(("word/_rels/document.xml.rels".to_string(), rels_xml(&rels)));
        }

        if let Some((title, author)) = &self.core {
            package_rels.push((
                "rId2".to_string(),
                "metadata/core-properties",
                "docProps/core.xml".to_string(),
                false,
            ));
            parts.push(("docProps/core.xml".to_string(), core_xml(title, author)));
        }
        parts.push(("_rels/.rels".to_string(), rels_xml(&package_rels)));

        write_zip(path, &parts);
    }
}

/// One slide's content.
#[derive(Default)]
pub struct SlideFixture {
    shapes: String,
    rels: Vec<(String, &'static str, String, bool)>,
    media: Vec<(String, Vec<u8>)>,
}

impl SlideFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str) -> Self {
        self.shapes.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox"/></p:nvSpPr><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            escape(text)
        ));
        self
    }

    pub fn link(mut self, text: &str, address: &str) -> Self {
        let id = format!("rIdLink{}", self.rels.len() + 1);
        self.rels.push((id.clone(), "hyperlink", address.to_string(), true));
        self.shapes.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Link"/></p:nvSpPr><p:txBody><a:p><a:r><a:rPr><a:hlinkClick r:id="{}"/></a:rPr><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            id,
            escape(text)
        ));
        self
    }

    /// Picture shape whose media part holds `data` under `file_name`.
    pub fn picture(mut self, file_name: &str, data: Vec<u8>) -> Self {
        let id = format!("rIdImg{}", self.rels.len() + 1);
        self.rels.push((id.clone(), "image", format!("../media/{}", file_name), false));
        self.media.push((format!("ppt/media/{}", file_name), data));
        self.shapes.push_str(&format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="{}"/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill></p:pic>"#,
            escape(file_name),
            id
        ));
        self
    }

    /// Picture shape whose relationship points at a part the package lacks.
    pub fn dangling_picture(mut self, file_name: &str) -> Self {
        let id = format!("rIdImg{}", self.rels.len() + 1);
        self.rels.push((id.clone(), "image", format!("../media/{}", file_name), false));
        self.shapes.push_str(&format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="6" name="{}"/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill></p:pic>"#,
            escape(file_name),
            id
        ));
        self
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        let mut tbl = String::from("<a:tbl>");
        for row in rows {
            tbl.push_str("<a:tr>");
            for cell in *row {
                tbl.push_str(&format!(
                    "<a:tc><a:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody></a:tc>",
                    escape(cell)
                ));
            }
            tbl.push_str("</a:tr>");
        }
        tbl.push_str("</a:tbl>");
        self.shapes.push_str(&format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="Table"/></p:nvGraphicFramePr><a:graphic><a:graphicData>{}</a:graphicData></a:graphic></p:graphicFrame>"#,
            tbl
        ));
        self
    }
}

/// Presentation builder.
#[derive(Default)]
pub struct PptxFixture {
    slides: Vec<SlideFixture>,
    core: Option<(String, String)>,
}

impl PptxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, slide: SlideFixture) -> Self {
        self.slides.push(slide);
        self
    }

    pub fn core(mut self, title: &str, author: &str) -> Self {
        self.core = Some((title.to_string(), author.to_string()));
        self
    }

    pub fn write(self, path: &Path) {
        let mut parts = Vec::new();
        let mut presentation_rels = Vec::new();
        let mut slide_ids = String::new();

        for (i, slide) in self.slides.into_iter().enumerate() {
            let n = i + 1;
            let rid = format!("rId{}", n);
            slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + n, rid));
            presentation_rels.push((rid, "slide", format!("slides/slide{}.xml", n), false));

            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="{}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
                REL_NS, slide.shapes
            );
            parts.push((format!("ppt/slides/slide{}.xml", n), xml.into_bytes()));
            if !slide.rels.is_empty() {
                parts.push((format!("ppt/slides/_rels/slide{}.xml.rels", n), rels_xml(&slide.rels)));
            }
            parts.extend(slide.media);
        }

        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="{}"><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            REL_NS, slide_ids
        );
        parts.push(("ppt/presentation.xml".to_string(), presentation.into_bytes()));
        parts.push(("ppt/_rels/presentation.xml.rels".to_string(), rels_xml(&presentation_rels)));

        let mut package_rels = vec![(
            "rId1".to_string(),
            "officeDocument",
            "ppt/presentation.xml".to_string(),
            false,
        )];
        if let Some((title, author)) = &self.core {
            package_rels.push((
                "rId2".to_string(),
                "metadata/core-properties",
                "docProps/core.xml".to_string(),
                false,
            ));
            parts.push(("docProps/core.xml".to_string(), core_xml(title, author)));
        }
        parts.push(("_rels/.rels".to_string(), rels_xml(&package_rels)));

        write_zip(path, &parts);
    }
}

// ==================== PDF ====================

/// Single-page PDF builder.
#[derive(Default)]
pub struct PdfFixture {
    lines: Vec<(f32, f32, String)>,
    uris: Vec<String>,
    jpeg: Option<Vec<u8>>,
    title: Option<String>,
}

impl PdfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text drawn at (`x`, `y`).
    pub fn text_at(mut self, x: f32, y: f32, text: &str) -> Self {
        self.lines.push((x, y, text.to_string()));
        self
    }

    pub fn uri(mut self, uri: &str) -> Self {
        self.uris.push(uri.to_string());
        self
    }

    pub fn jpeg(mut self, data: Vec<u8>) -> Self {
        self.jpeg = Some(data);
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn write(self, path: &Path) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut operations = Vec::new();
        for (x, y, text) in &self.lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text.as_str())]));
            operations.push(Operation::new("ET", vec![]));
        }

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if let Some(jpeg) = self.jpeg {
            let (width, height) = image::load_from_memory(&jpeg)
                .map(|img| (img.width() as i64, img.height() as i64))
                .unwrap();
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            ));
            resources.set("XObject", dictionary! { "Im1" => image_id });
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![100.into(), 0.into(), 0.into(), 100.into(), 100.into(), 100.into()],
            ));
            operations.push(Operation::new("Do", vec!["Im1".into()]));
            operations.push(Operation::new("Q", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let annots: Vec<Object> = self
            .uris
            .iter()
            .map(|uri| {
                Object::Dictionary(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Link",
                    "Rect" => vec![0.into(), 0.into(), 100.into(), 20.into()],
                    "A" => dictionary! {
                        "S" => "URI",
                        "URI" => Object::string_literal(uri.as_str()),
                    },
                })
            })
            .collect();

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !annots.is_empty() {
            page.set("Annots", annots);
        }
        let page_id = doc.add_object(page);

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
                "Producer" => Object::string_literal("docextract tests"),
            });
            doc.trailer.set("Info", info_id);
        }

        doc.save(path).unwrap();
    }
}

// ==================== OCR ====================

/// OCR engine that "recognizes" a fixed text for every rasterized page.
pub struct FakeOcr {
    pub pages: usize,
    pub text: Option<String>,
}

impl FakeOcr {
    pub fn reading(text: &str) -> Arc<Self> {
        Arc::new(Self {
            pages: 1,
            text: Some(text.to_string()),
        })
    }

    /// An engine whose recognition always fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { pages: 1, text: None })
    }
}

impl OcrEngine for FakeOcr {
    fn rasterize(&self, _pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        (1..=self.pages)
            .map(|n| {
                let page = out_dir.join(format!("page-{}.png", n));
                fs::write(&page, png_bytes(2, 2))?;
                Ok(page)
            })
            .collect()
    }

    fn recognize(&self, _page: &Path) -> Result<String> {
        self.text
            .clone()
            .ok_or_else(|| Error::Ocr("nothing recognized".to_string()))
    }
}
