//! Embedded picture payloads.

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw bytes of one picture found in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBlob {
    /// Raw binary data
    #[serde(skip_serializing)]
    pub data: Vec<u8>,

    /// Name of the picture inside the document (part name, XObject name), if known
    pub name: Option<String>,
}

impl ImageBlob {
    /// Create a new blob.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, name: None }
    }

    /// Set the source name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Infer the image format from the payload and check that it decodes.
    ///
    /// Sinks only persist blobs that pass this check.
    pub fn decode_format(&self) -> Result<ImageFormat> {
        let format = image::guess_format(&self.data)?;
        image::load_from_memory_with_format(&self.data, format)?;
        Ok(format)
    }

    /// File extension for a decoded format: the format's own name where it
    /// has one (`jpeg`, `tiff`), its usual extension otherwise.
    pub fn extension(format: ImageFormat) -> &'static str {
        match format {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Tiff => "tiff",
            other => other.extensions_str().first().copied().unwrap_or("bin"),
        }
    }
}
