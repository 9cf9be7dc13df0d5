//! PDF documents.
//!
//! Text comes from `pdf-extract` (or OCR) once, at load time. Every other
//! category re-reads the object model with lopdf per call, so a handle stays
//! small and extraction stays stateless.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::diagnostics::{Reporter, Stage};
use crate::error::{Error, Result};
use crate::extractor::{ImageSource, LinkSource, MetadataSource, TableSource, TextSource};
use crate::model::{Category, ImageBlob, Link, Metadata, Table};

use super::layout::{self, decode_text};
use super::table_detector::TableDetector;

/// A loaded PDF: its path and the text produced at load time.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    path: PathBuf,
    text: String,
}

impl PdfDocument {
    /// Wrap a validated path and its loaded text.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<LopdfDocument> {
        Ok(LopdfDocument::load(&self.path)?)
    }
}

/// Layout-aware text of the whole document.
///
/// `pdf-extract` panics on some malformed fonts; a panic is reported as an error.
pub fn primary_text(path: &Path) -> Result<String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::PdfText("text extractor panicked".to_string())),
    }
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// URI targets of a page's link annotations.
fn page_links(doc: &LopdfDocument, page_id: ObjectId) -> Vec<String> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Ok(annots) = page.get(b"Annots") else {
        return Vec::new();
    };
    let Ok(annots) = resolve(doc, annots).as_array() else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|annot| resolve_dict(doc, annot))
        .filter_map(|annot| annot.get(b"A").ok().and_then(|a| resolve_dict(doc, a)))
        .filter_map(|action| action.get(b"URI").ok())
        .filter_map(|uri| match resolve(doc, uri) {
            Object::String(bytes, _) => Some(decode_text(bytes)),
            _ => None,
        })
        .collect()
}

/// A page's resource dictionary, inherited through `Parent` when absent.
fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Bounded walk; a malformed tree could loop.
    for _ in 0..32 {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        let parent = node.get(b"Parent").ok()?;
        node = resolve_dict(doc, parent)?;
    }
    None
}

/// Image XObjects of a page, by resource name.
fn page_images(doc: &LopdfDocument, page_id: ObjectId) -> Vec<(String, &Stream)> {
    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|x| resolve_dict(doc, x))
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(name, obj)| match resolve(doc, obj) {
            Object::Stream(stream) => Some((String::from_utf8_lossy(name).into_owned(), stream)),
            _ => None,
        })
        .filter(|(_, stream)| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|s| s == b"Image")
        })
        .collect()
}

fn filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Bytes of an image XObject in a format image tools understand.
///
/// JPEG and JPEG 2000 streams are already files. Flate-compressed 8-bit
/// gray or RGB samples are wrapped into a PNG. Anything else is passed
/// through raw and left to the sinks' decode check.
fn image_bytes(doc: &LopdfDocument, stream: &Stream) -> Result<Vec<u8>> {
    let filters = filters(&stream.dict);

    if filters.iter().any(|f| f == "DCTDecode" || f == "JPXDecode") {
        return Ok(stream.content.clone());
    }

    if filters.iter().any(|f| f == "FlateDecode") {
        let samples = stream.decompressed_content()?;
        if let Some(png) = samples_to_png(doc, &stream.dict, samples)? {
            return Ok(png);
        }
    }

    Ok(stream.content.clone())
}

fn samples_to_png(doc: &LopdfDocument, dict: &Dictionary, samples: Vec<u8>) -> Result<Option<Vec<u8>>> {
    let number = |key: &[u8]| dict.get(key).ok().and_then(|o| o.as_i64().ok());
    let (Some(width), Some(height)) = (number(b"Width"), number(b"Height")) else {
        return Ok(None);
    };
    if number(b"BitsPerComponent") != Some(8) {
        return Ok(None);
    }
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Ok(None);
    };

    let color_space = match dict.get(b"ColorSpace").map(|cs| resolve(doc, cs)) {
        Ok(Object::Name(name)) => name.clone(),
        _ => return Ok(None),
    };

    let img = match color_space.as_slice() {
        b"DeviceRGB" => image::RgbImage::from_raw(width, height, samples).map(image::DynamicImage::ImageRgb8),
        b"DeviceGray" => image::GrayImage::from_raw(width, height, samples).map(image::DynamicImage::ImageLuma8),
        _ => None,
    };
    let Some(img) = img else {
        return Ok(None);
    };

    let mut png = std::io::Cursor::new(Vec::new());
    img.write_to(&mut png, image::ImageFormat::Png)?;
    Ok(Some(png.into_inner()))
}

/// Info dictionary entries mapped onto metadata keys.
fn info_metadata(doc: &LopdfDocument) -> Metadata {
    let mut metadata = Metadata::new();

    let Some(info) = doc.trailer.get(b"Info").ok().and_then(|i| resolve_dict(doc, i)) else {
        return metadata;
    };

    for (key, value) in info.iter() {
        let Some(value) = info_value(resolve(doc, value)) else {
            continue;
        };
        match key.as_slice() {
            b"Title" => metadata.title = Some(value),
            b"Author" => metadata.author = Some(value),
            b"Subject" => metadata.subject = Some(value),
            b"Keywords" => metadata.keywords = Some(value),
            b"CreationDate" => metadata.created = Some(normalize_date(&value)),
            b"ModDate" => metadata.modified = Some(normalize_date(&value)),
            other => {
                metadata
                    .extra
                    .insert(String::from_utf8_lossy(other).into_owned(), value);
            }
        }
    }

    metadata
}

fn info_value(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Integer(i) => Some(i.to_string()),
        Object::Real(r) => Some(r.to_string()),
        Object::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// RFC 3339 for a parseable PDF date, the input unchanged otherwise.
fn normalize_date(raw: &str) -> String {
    parse_pdf_date(raw)
        .map(|date| date.to_rfc3339())
        .unwrap_or_else(|| raw.to_string())
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`).
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 4 || !s.is_char_boundary(4) {
        return None;
    }

    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match s.get(range) {
            Some(digits) if digits.chars().all(|c| c.is_ascii_digit()) => digits.parse().ok(),
            Some(_) => None,
            None => Some(default),
        }
    };

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month = field(4..6, 1)?;
    let day = field(6..8, 1)?;
    let hour = field(8..10, 0)?;
    let minute = field(10..12, 0)?;
    let second = field(12..14, 0)?;

    let offset = parse_offset(s.get(14..).unwrap_or(""))?;

    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    naive.and_local_timezone(offset).single()
}

/// `Z`, `+HH'mm'`, `-HH'mm`, or nothing (UTC).
fn parse_offset(s: &str) -> Option<chrono::FixedOffset> {
    let mut chars = s.chars();
    let sign = match chars.next() {
        None | Some('Z') => return chrono::FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };

    let digits: String = chars.filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
    chrono::FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl TextSource for PdfDocument {
    fn text(&self, _reporter: &Reporter<'_>) -> Result<String> {
        Ok(self.text.clone())
    }
}

impl LinkSource for PdfDocument {
    fn links(&self, _reporter: &Reporter<'_>) -> Result<Vec<Link>> {
        let doc = self.open()?;
        Ok(doc
            .get_pages()
            .values()
            .flat_map(|page_id| page_links(&doc, *page_id))
            .map(Link::new)
            .collect())
    }
}

impl ImageSource for PdfDocument {
    fn images(&self, reporter: &Reporter<'_>) -> Result<Vec<ImageBlob>> {
        let doc = self.open()?;

        let mut images = Vec::new();
        let mut item = 0;
        for (page_num, page_id) in doc.get_pages() {
            for (name, stream) in page_images(&doc, page_id) {
                item += 1;
                match image_bytes(&doc, stream) {
                    Ok(data) => images.push(ImageBlob::new(data).with_name(format!("page{}/{}", page_num, name))),
                    Err(e) => reporter.skipped(Stage::Extract, Some(Category::Images), item, e),
                }
            }
        }
        Ok(images)
    }
}

impl TableSource for PdfDocument {
    fn tables(&self, reporter: &Reporter<'_>) -> Result<Vec<Table>> {
        let doc = self.open()?;
        let detector = TableDetector::new();

        let mut tables = Vec::new();
        for (page_num, page_id) in doc.get_pages() {
            let spans = layout::page_content(&doc, page_id).and_then(|content| layout::extract_spans(&content));
            match spans {
                Ok(spans) => tables.extend(detector.detect(&spans)),
                Err(e) => reporter.skipped(
                    Stage::Extract,
                    Some(Category::Tables),
                    page_num as usize,
                    format!("page {}: {}", page_num, e),
                ),
            }
        }
        Ok(tables)
    }
}

impl MetadataSource for PdfDocument {
    fn metadata(&self, _reporter: &Reporter<'_>) -> Result<Metadata> {
        let doc = self.open()?;
        Ok(info_metadata(&doc))
    }
}
