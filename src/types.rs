//! Core types for photo-editing operations

use crate::config::OutputFormat;
use crate::error::{EditorError, Result};
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, Rgba};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Opaque unit of image data: encoded bytes plus declared format
///
/// A `RasterImage` is immutable once produced. Every edit step yields a new
/// value; the superseded one is released when dropped, which replaces the
/// original system's manual object-URL lifetime management with plain scoped
/// ownership.
#[derive(Debug, Clone)]
pub struct RasterImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    dimensions: (u32, u32),
}

impl RasterImage {
    /// Build a raster image from encoded bytes, validating that they decode
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Decode` for corrupt bytes or unsupported formats.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&bytes)
            .map_err(|e| EditorError::decode(format!("unrecognized image format: {}", e)))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| EditorError::decode(format!("failed to decode image: {}", e)))?;
        let dimensions = (decoded.width(), decoded.height());
        Ok(Self {
            bytes,
            format,
            dimensions,
        })
    }

    /// Encode a decoded image into a new raster image
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Image` if encoding fails.
    pub fn from_image(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Self> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        let image_format = match format {
            OutputFormat::Png => {
                image.write_to(&mut cursor, ImageFormat::Png)?;
                ImageFormat::Png
            },
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel; drop it before encoding
                let rgb_image = image.to_rgb8();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
                encoder.encode_image(&rgb_image)?;
                ImageFormat::Jpeg
            },
            OutputFormat::WebP => {
                image.write_to(&mut cursor, ImageFormat::WebP)?;
                ImageFormat::WebP
            },
        };
        let dimensions = (image.width(), image.height());
        Ok(Self {
            bytes: buffer,
            format: image_format,
            dimensions,
        })
    }

    /// Read and decode-validate an image file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(&path)
            .map_err(|e| EditorError::file_io_error("read image file", &path, e))?;
        Self::from_bytes(bytes)
    }

    /// Decode into a `DynamicImage` for raster work
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Decode` if the bytes no longer decode. This only
    /// happens for values constructed with `from_bytes` whose source was
    /// truncated mid-stream in a way the initial validation accepted.
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| EditorError::decode(format!("failed to decode image: {}", e)))
    }

    /// Encoded bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the value, returning the encoded bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Declared encoding of the backing bytes
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the backing bytes (e.g. `image/png`)
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Pixel dimensions, known without re-decoding
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// Size of the encoded representation in bytes
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Write the encoded bytes to a file as-is
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(&path, &self.bytes)
            .map_err(|e| EditorError::file_io_error("write image file", &path, e))?;
        Ok(())
    }
}

/// Background applied behind the subject when composing the final image
#[derive(Debug, Clone)]
pub enum Background {
    /// Keep the subject's transparency
    Transparent,
    /// Solid fill color
    Solid(Rgba<u8>),
    /// Externally supplied image, scaled cover-fit behind the subject
    Image(RasterImage),
}

impl Background {
    /// Parse a `#rrggbb` or `#rrggbbaa` hex string into a solid background
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidConfig` for malformed hex strings.
    pub fn solid_from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let parse = |range: std::ops::Range<usize>| -> Result<u8> {
            u8::from_str_radix(digits.get(range).unwrap_or(""), 16)
                .map_err(|_| EditorError::invalid_config(format!("invalid hex color '{}'", hex)))
        };
        match digits.len() {
            6 => Ok(Self::Solid(Rgba([
                parse(0..2)?,
                parse(2..4)?,
                parse(4..6)?,
                255,
            ]))),
            8 => Ok(Self::Solid(Rgba([
                parse(0..2)?,
                parse(2..4)?,
                parse(4..6)?,
                parse(6..8)?,
            ]))),
            _ => Err(EditorError::invalid_config(format!(
                "invalid hex color '{}' (expected #rrggbb or #rrggbbaa)",
                hex
            ))),
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::Transparent
    }
}

/// Timing breakdown for one edit operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditTimings {
    /// Time spent decoding the source image (milliseconds)
    pub decode_ms: u64,
    /// Time spent in the raster operation itself (milliseconds)
    pub operation_ms: u64,
    /// Time spent encoding the result (milliseconds)
    pub encode_ms: u64,
    /// End-to-end time including any remote call (milliseconds)
    pub total_ms: u64,
}

/// Metadata recorded alongside each committed edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditMetadata {
    /// Which operation produced the image (crop, resize, adjust, ...)
    pub operation: String,
    /// When the operation completed
    pub completed_at: DateTime<Utc>,
    /// Timing breakdown
    pub timings: EditTimings,
}

impl EditMetadata {
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            completed_at: Utc::now(),
            timings: EditTimings::default(),
        }
    }

    #[must_use]
    pub fn with_timings(mut self, timings: EditTimings) -> Self {
        self.timings = timings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn sample_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([120, 80, 40, 255]),
        ))
    }

    #[test]
    fn test_raster_image_round_trip() {
        let raster = RasterImage::from_image(&sample_image(64, 48), OutputFormat::Png, 100)
            .expect("encode png");
        assert_eq!(raster.dimensions(), (64, 48));
        assert_eq!(raster.format(), ImageFormat::Png);
        assert_eq!(raster.mime_type(), "image/png");

        let decoded = raster.decode().expect("decode png");
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn test_raster_image_from_bytes_validates() {
        let err = RasterImage::from_bytes(vec![0, 1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, EditorError::Decode(_)));
    }

    #[test]
    fn test_raster_image_jpeg_drops_alpha() {
        let raster = RasterImage::from_image(&sample_image(10, 10), OutputFormat::Jpeg, 90)
            .expect("encode jpeg");
        assert_eq!(raster.format(), ImageFormat::Jpeg);
        let decoded = raster.decode().expect("decode jpeg");
        assert_eq!(decoded.color().channel_count(), 3);
    }

    #[test]
    fn test_background_hex_parsing() {
        match Background::solid_from_hex("#ff8000").unwrap() {
            Background::Solid(color) => assert_eq!(color, Rgba([255, 128, 0, 255])),
            other => panic!("expected solid background, got {:?}", other),
        }
        match Background::solid_from_hex("10203040").unwrap() {
            Background::Solid(color) => assert_eq!(color, Rgba([16, 32, 48, 64])),
            other => panic!("expected solid background, got {:?}", other),
        }
        assert!(Background::solid_from_hex("#zzz").is_err());
        assert!(Background::solid_from_hex("#12345").is_err());
    }

    #[test]
    fn test_edit_metadata() {
        let metadata = EditMetadata::new("crop").with_timings(EditTimings {
            decode_ms: 2,
            operation_ms: 5,
            encode_ms: 3,
            total_ms: 10,
        });
        assert_eq!(metadata.operation, "crop");
        assert_eq!(metadata.timings.total_ms, 10);
    }
}
