//! CLI argument to library configuration conversion

use super::main_impl::{Cli, CliOutputFormat};
use crate::config::{EditorConfig, OutputFormat};
use anyhow::{Context, Result};
use std::time::Duration;

/// Builds an `EditorConfig` from parsed CLI arguments
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Validate argument combinations before building
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.jpeg_quality > 100 {
            anyhow::bail!("JPEG quality must be 0-100, got {}", cli.jpeg_quality);
        }
        if cli.webp_quality > 100 {
            anyhow::bail!("WebP quality must be 0-100, got {}", cli.webp_quality);
        }
        if cli.timeout == 0 {
            anyhow::bail!("timeout must be positive");
        }
        Ok(())
    }

    /// Convert CLI arguments to the library configuration
    pub(crate) fn from_cli(cli: &Cli) -> Result<EditorConfig> {
        let mut builder = EditorConfig::builder()
            .output_format(Self::convert_format(cli.format))
            .jpeg_quality(cli.jpeg_quality)
            .webp_quality(cli.webp_quality)
            .export_max_dimension(cli.max_dimension)
            .remote_timeout(Duration::from_secs(cli.timeout))
            .debug(cli.verbose >= 2);

        if let Some(key) = Self::remove_bg_key(cli) {
            builder = builder.remove_bg_api_key(key);
        }
        if let Some(key) = Self::upscale_key(cli) {
            builder = builder.upscale_api_key(key);
        }
        if let Some(endpoint) = &cli.remove_bg_endpoint {
            builder = builder.remove_bg_endpoint(endpoint);
        }
        if let Some(endpoint) = &cli.upscale_endpoint {
            builder = builder.upscale_endpoint(endpoint);
        }
        if let Some(text) = &cli.watermark_text {
            builder = builder.watermark_text(text);
        }

        builder.build().context("Failed to build configuration")
    }

    /// API key from argument or `REMOVE_BG_API_KEY`
    fn remove_bg_key(cli: &Cli) -> Option<String> {
        cli.remove_bg_api_key
            .clone()
            .or_else(|| std::env::var("REMOVE_BG_API_KEY").ok())
    }

    /// API key from argument or `DEEPAI_API_KEY`
    fn upscale_key(cli: &Cli) -> Option<String> {
        cli.upscale_api_key
            .clone()
            .or_else(|| std::env::var("DEEPAI_API_KEY").ok())
    }

    fn convert_format(format: CliOutputFormat) -> OutputFormat {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Webp => OutputFormat::WebP,
        }
    }
}
