//! Configuration types for the photo-editing engine

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, quality-controlled)
    Jpeg,
    /// WebP with alpha channel transparency
    WebP,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::WebP => write!(f, "webp"),
        }
    }
}

/// Watermark appearance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Text stamped on free-tier exports
    pub text: String,
    /// TTF/OTF font bytes used to rasterize the text; without a font only the
    /// translucent badge is stamped
    #[serde(skip)]
    pub font_bytes: Option<Vec<u8>>,
    /// Text size in pixels
    pub font_size: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: "Made with snapedit".to_string(),
            font_bytes: None,
            font_size: 18.0,
        }
    }
}

/// Configuration for the edit session and its collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Format used when encoding committed edits and exports
    pub output_format: OutputFormat,
    /// JPEG quality (0-100)
    pub jpeg_quality: u8,
    /// WebP quality (0-100)
    pub webp_quality: u8,
    /// Longest edge allowed in standard-quality exports; high-quality exports
    /// bypass this cap
    pub export_max_dimension: u32,
    /// Longest edge uploaded to the background-removal service; larger inputs
    /// are downscaled and re-encoded before upload
    pub upload_max_dimension: u32,
    /// Watermark appearance
    pub watermark: WatermarkConfig,
    /// Background-removal service endpoint
    pub remove_bg_endpoint: String,
    /// Background-removal service API key
    pub remove_bg_api_key: String,
    /// Upscaling service endpoint
    pub upscale_endpoint: String,
    /// Upscaling service API key
    pub upscale_api_key: String,
    /// Timeout applied to every remote call
    pub remote_timeout: Duration,
    /// Enable debug mode
    pub debug: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Png,
            jpeg_quality: 90,
            webp_quality: 85,
            export_max_dimension: 1024,
            upload_max_dimension: 1024,
            watermark: WatermarkConfig::default(),
            remove_bg_endpoint: "https://api.remove.bg/v1.0/removebg".to_string(),
            remove_bg_api_key: String::new(),
            upscale_endpoint: "https://api.deepai.org/api/torch-srgan".to_string(),
            upscale_api_key: String::new(),
            remote_timeout: Duration::from_secs(30),
            debug: false,
        }
    }
}

impl EditorConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::new()
    }

    /// Quality value for the given output format
    #[must_use]
    pub fn quality_for(&self, format: OutputFormat) -> u8 {
        match format {
            OutputFormat::Jpeg => self.jpeg_quality,
            OutputFormat::WebP => self.webp_quality,
            OutputFormat::Png => 100,
        }
    }
}

/// Builder for `EditorConfig`
pub struct EditorConfigBuilder {
    config: EditorConfig,
}

impl EditorConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EditorConfig::default(),
        }
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    #[must_use]
    pub fn webp_quality(mut self, quality: u8) -> Self {
        self.config.webp_quality = quality;
        self
    }

    #[must_use]
    pub fn export_max_dimension(mut self, edge: u32) -> Self {
        self.config.export_max_dimension = edge;
        self
    }

    #[must_use]
    pub fn upload_max_dimension(mut self, edge: u32) -> Self {
        self.config.upload_max_dimension = edge;
        self
    }

    #[must_use]
    pub fn watermark_text(mut self, text: impl Into<String>) -> Self {
        self.config.watermark.text = text.into();
        self
    }

    #[must_use]
    pub fn watermark_font(mut self, font_bytes: Vec<u8>) -> Self {
        self.config.watermark.font_bytes = Some(font_bytes);
        self
    }

    #[must_use]
    pub fn watermark_font_size(mut self, size: f32) -> Self {
        self.config.watermark.font_size = size;
        self
    }

    #[must_use]
    pub fn remove_bg_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.remove_bg_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn remove_bg_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.remove_bg_api_key = key.into();
        self
    }

    #[must_use]
    pub fn upscale_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.upscale_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn upscale_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.upscale_api_key = key.into();
        self
    }

    #[must_use]
    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.config.remote_timeout = timeout;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidConfig` for:
    /// - Quality values above 100
    /// - Zero export/upload dimension caps
    /// - Zero remote timeout
    /// - Non-positive watermark font size
    pub fn build(self) -> Result<EditorConfig> {
        if self.config.jpeg_quality > 100 {
            return Err(EditorError::config_value_error(
                "jpeg_quality",
                self.config.jpeg_quality,
                "0-100",
            ));
        }
        if self.config.webp_quality > 100 {
            return Err(EditorError::config_value_error(
                "webp_quality",
                self.config.webp_quality,
                "0-100",
            ));
        }
        if self.config.export_max_dimension == 0 {
            return Err(EditorError::invalid_config(
                "export_max_dimension must be positive",
            ));
        }
        if self.config.upload_max_dimension == 0 {
            return Err(EditorError::invalid_config(
                "upload_max_dimension must be positive",
            ));
        }
        if self.config.remote_timeout.is_zero() {
            return Err(EditorError::invalid_config(
                "remote_timeout must be positive",
            ));
        }
        if !self.config.watermark.font_size.is_finite() || self.config.watermark.font_size <= 0.0 {
            return Err(EditorError::invalid_config(
                "watermark font_size must be positive",
            ));
        }
        Ok(self.config)
    }
}

impl Default for EditorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = EditorConfig::builder().build().unwrap();
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.export_max_dimension, 1024);
        assert_eq!(config.remote_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_chain() {
        let config = EditorConfig::builder()
            .output_format(OutputFormat::Jpeg)
            .jpeg_quality(95)
            .export_max_dimension(2048)
            .watermark_text("demo")
            .remote_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.export_max_dimension, 2048);
        assert_eq!(config.watermark.text, "demo");
        assert_eq!(config.remote_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_rejects_invalid() {
        assert!(EditorConfig::builder().jpeg_quality(101).build().is_err());
        assert!(EditorConfig::builder()
            .export_max_dimension(0)
            .build()
            .is_err());
        assert!(EditorConfig::builder()
            .remote_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(EditorConfig::builder()
            .watermark_font_size(0.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_quality_for_format() {
        let config = EditorConfig::default();
        assert_eq!(config.quality_for(OutputFormat::Jpeg), 90);
        assert_eq!(config.quality_for(OutputFormat::WebP), 85);
        assert_eq!(config.quality_for(OutputFormat::Png), 100);
    }
}
