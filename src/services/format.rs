//! Output format handling service
//!
//! Separates format conversion logic from the edit pipeline, keeping the
//! session and compositor free of per-format branching.

use crate::config::OutputFormat;
use image::{DynamicImage, RgbaImage};

/// Service for handling output format conversions
///
/// Frontend-facing: prepares display buffers and answers format capability
/// queries for UIs. The encode path itself lives in `RasterImage::from_image`,
/// which performs the same per-format conversion when writing bytes.
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an RGBA image to the pixel layout the format encodes
    ///
    /// # Examples
    /// ```rust
    /// use snapedit::{services::OutputFormatHandler, config::OutputFormat};
    /// use image::RgbaImage;
    ///
    /// let rgba_image = RgbaImage::new(100, 100);
    /// let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Png);
    /// assert_eq!(converted.width(), 100);
    /// ```
    #[must_use]
    pub fn convert_format(rgba_image: RgbaImage, format: OutputFormat) -> DynamicImage {
        match format {
            OutputFormat::Png | OutputFormat::WebP => DynamicImage::ImageRgba8(rgba_image),
            // JPEG has no alpha channel
            OutputFormat::Jpeg => {
                DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba_image).to_rgb8())
            },
        }
    }

    /// File extension for a given output format (without the dot)
    ///
    /// # Examples
    /// ```rust
    /// use snapedit::{services::OutputFormatHandler, config::OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    /// Whether a format supports transparency (alpha channel)
    ///
    /// # Examples
    /// ```rust
    /// use snapedit::{services::OutputFormatHandler, config::OutputFormat};
    ///
    /// assert!(OutputFormatHandler::supports_transparency(OutputFormat::Png));
    /// assert!(!OutputFormatHandler::supports_transparency(OutputFormat::Jpeg));
    /// ```
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// Warn when a format cannot preserve background-removal transparency
    pub fn validate_for_background_removal(format: OutputFormat) {
        if !Self::supports_transparency(format) {
            log::warn!(
                "Output format {:?} does not support transparency. Background removal results may appear with a solid background.",
                format
            );
        }
    }

    /// Recommended quality settings for a format
    ///
    /// Returns `(default, min, max)`, or `None` for lossless formats.
    #[must_use]
    pub fn get_quality_range(format: OutputFormat) -> Option<(u8, u8, u8)> {
        match format {
            OutputFormat::Jpeg => Some((90, 0, 100)),
            OutputFormat::WebP => Some((85, 0, 100)),
            OutputFormat::Png => None, // Lossless
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_convert_format_png() {
        let rgba_image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Png);
        assert_eq!(converted.width(), 2);
        assert_eq!(converted.height(), 2);
        assert!(matches!(converted, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_convert_format_jpeg_drops_alpha() {
        let rgba_image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 128]));
        let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Jpeg);

        match converted {
            DynamicImage::ImageRgb8(_) => {}, // Expected
            _ => panic!("Expected RGB8 image for JPEG format"),
        }
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
        assert_eq!(
            OutputFormatHandler::get_extension(OutputFormat::Jpeg),
            "jpg"
        );
        assert_eq!(
            OutputFormatHandler::get_extension(OutputFormat::WebP),
            "webp"
        );
    }

    #[test]
    fn test_supports_transparency() {
        assert!(OutputFormatHandler::supports_transparency(
            OutputFormat::Png
        ));
        assert!(OutputFormatHandler::supports_transparency(
            OutputFormat::WebP
        ));
        assert!(!OutputFormatHandler::supports_transparency(
            OutputFormat::Jpeg
        ));
    }

    #[test]
    fn test_get_quality_range() {
        assert_eq!(
            OutputFormatHandler::get_quality_range(OutputFormat::Jpeg),
            Some((90, 0, 100))
        );
        assert_eq!(
            OutputFormatHandler::get_quality_range(OutputFormat::WebP),
            Some((85, 0, 100))
        );
        assert_eq!(
            OutputFormatHandler::get_quality_range(OutputFormat::Png),
            None
        );
    }
}
