// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — wraps one in-memory image on its way from a captured
// surface (or the filter service) into the assembled PDF.

use dicomwerk_core::error::DicomwerkError;
use image::{DynamicImage, ImageFormat, RgbaImage};
use printpdf::{RawImage, RawImageData, RawImageFormat};
use tracing::{debug, instrument};

/// A single in-memory image.
///
/// ```ignore
/// let png = ImageProcessor::from_rgba(frame).to_png_bytes()?;
/// let raw = ImageProcessor::from_bytes(&png)?.to_raw_image();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from encoded bytes (PNG, BMP, JPEG, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DicomwerkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            DicomwerkError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap a raster captured from a render surface.
    pub fn from_rgba(frame: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(frame),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, DicomwerkError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Flatten to RGB8 for embedding in a PDF page.
    pub fn to_raw_image(&self) -> RawImage {
        let rgb = self.image.to_rgb8();
        RawImage {
            width: rgb.width() as usize,
            height: rgb.height() as usize,
            pixels: RawImageData::U8(rgb.into_raw()),
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        }
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, DicomwerkError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        DicomwerkError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
