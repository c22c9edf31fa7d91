//! snapedit CLI tool
//!
//! Command-line interface for the offline compositing operations plus the
//! remote background-removal and upscaling services.

use super::config::CliConfigBuilder;
use crate::geometry::{CropArea, EditAdjustments, FilterKind, ResizeSpec};
use crate::remote::{BackgroundRemover, RemoveBgClient, SrganClient, UpscaleFactor, Upscaler};
use crate::services::{ImageIOService, OutputFormatHandler};
use crate::types::{Background, RasterImage};
use crate::{Compositor, EditorConfig};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

/// Photo-editing CLI tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "snapedit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Png, global = true)]
    pub format: CliOutputFormat,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = 90, global = true)]
    pub jpeg_quality: u8,

    /// WebP quality (0-100)
    #[arg(long, default_value_t = 85, global = true)]
    pub webp_quality: u8,

    /// Longest edge for standard-quality exports
    #[arg(long, default_value_t = 1024, global = true)]
    pub max_dimension: u32,

    /// Watermark text for the watermark subcommand
    #[arg(long, global = true)]
    pub watermark_text: Option<String>,

    /// remove.bg-style API key [env: REMOVE_BG_API_KEY]
    #[arg(long, global = true)]
    pub remove_bg_api_key: Option<String>,

    /// remove.bg-style endpoint override
    #[arg(long, global = true)]
    pub remove_bg_endpoint: Option<String>,

    /// Upscaling API key [env: DEEPAI_API_KEY]
    #[arg(long, global = true)]
    pub upscale_api_key: Option<String>,

    /// Upscaling endpoint override
    #[arg(long, global = true)]
    pub upscale_endpoint: Option<String>,

    /// Remote call timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
}

/// Shared input/output arguments
#[derive(Args)]
pub struct IoArgs {
    /// Input image file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file [default: derived from the input name]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Crop a sub-rectangle out of an image
    Crop {
        #[command(flatten)]
        io: IoArgs,
        /// Left edge of the crop rectangle
        #[arg(short, long)]
        x: u32,
        /// Top edge of the crop rectangle
        #[arg(short, long)]
        y: u32,
        /// Crop width in pixels
        #[arg(short = 'W', long)]
        width: u32,
        /// Crop height in pixels
        #[arg(short = 'H', long)]
        height: u32,
    },
    /// Resize an image
    Resize {
        #[command(flatten)]
        io: IoArgs,
        /// Target width; height follows the aspect ratio unless also given
        #[arg(short = 'W', long)]
        width: Option<u32>,
        /// Target height; width follows the aspect ratio unless also given
        #[arg(short = 'H', long)]
        height: Option<u32>,
        /// Uniform scale percentage (100 = identity)
        #[arg(short, long)]
        percentage: Option<f32>,
    },
    /// Apply brightness/contrast/saturation adjustments and a named filter
    Adjust {
        #[command(flatten)]
        io: IoArgs,
        /// Brightness adjustment (-100 to 100)
        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        brightness: i32,
        /// Contrast adjustment (-100 to 100)
        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        contrast: i32,
        /// Saturation adjustment (-100 to 100)
        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        saturation: i32,
        /// Named filter (none, grayscale, sepia, invert)
        #[arg(long, default_value = "none")]
        filter: FilterKind,
    },
    /// Composite the image over a background
    Compose {
        #[command(flatten)]
        io: IoArgs,
        /// Solid background colour as #rrggbb or #rrggbbaa
        #[arg(long, conflicts_with = "background_image")]
        background_color: Option<String>,
        /// Background image, scaled cover-fit behind the subject
        #[arg(long)]
        background_image: Option<PathBuf>,
    },
    /// Stamp the watermark badge onto an image
    Watermark {
        #[command(flatten)]
        io: IoArgs,
    },
    /// Remove the background via the configured remote service
    RemoveBg {
        #[command(flatten)]
        io: IoArgs,
    },
    /// Upscale via the configured remote service
    Upscale {
        #[command(flatten)]
        io: IoArgs,
        /// Upscaling factor
        #[arg(long, value_parser = parse_factor, default_value = "2")]
        factor: UpscaleFactor,
    },
}

fn parse_factor(value: &str) -> Result<UpscaleFactor, String> {
    match value {
        "2" => Ok(UpscaleFactor::X2),
        "4" => Ok(UpscaleFactor::X4),
        other => Err(format!("unsupported factor '{}' (expected 2 or 4)", other)),
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;
    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    match &cli.command {
        Command::Crop {
            io,
            x,
            y,
            width,
            height,
        } => {
            let image = ImageIOService::load_image(&io.input)?;
            let compositor = Compositor::from_config(&config);
            let result = compositor.crop(&image, CropArea::new(*x, *y, *width, *height))?;
            write_output(&result, io, "cropped", &config)
        },
        Command::Resize {
            io,
            width,
            height,
            percentage,
        } => {
            let spec = resize_spec(*width, *height, *percentage)?;
            let image = ImageIOService::load_image(&io.input)?;
            let compositor = Compositor::from_config(&config);
            let result = compositor.resize(&image, spec)?;
            write_output(&result, io, "resized", &config)
        },
        Command::Adjust {
            io,
            brightness,
            contrast,
            saturation,
            filter,
        } => {
            let adjustments = EditAdjustments::new(*brightness, *contrast, *saturation, *filter);
            let image = ImageIOService::load_image(&io.input)?;
            let compositor = Compositor::from_config(&config);
            let result = compositor.apply_adjustments(&image, adjustments)?;
            write_output(&result, io, "adjusted", &config)
        },
        Command::Compose {
            io,
            background_color,
            background_image,
        } => {
            let background = match (background_color, background_image) {
                (Some(hex), None) => Background::solid_from_hex(hex)?,
                (None, Some(path)) => Background::Image(ImageIOService::load_image(path)?),
                (None, None) => Background::Transparent,
                (Some(_), Some(_)) => unreachable!("clap rejects conflicting arguments"),
            };
            let subject = ImageIOService::load_image(&io.input)?;
            let compositor = Compositor::from_config(&config);
            let result = compositor.composite_background(&subject, &background)?;
            write_output(&result, io, "composed", &config)
        },
        Command::Watermark { io } => {
            let image = ImageIOService::load_image(&io.input)?;
            let compositor = Compositor::from_config(&config);
            let result = compositor.stamp_watermark(&image, &config.watermark)?;
            write_output(&result, io, "watermarked", &config)
        },
        Command::RemoveBg { io } => {
            OutputFormatHandler::validate_for_background_removal(config.output_format);
            let client = RemoveBgClient::new(&config)?;
            let image = ImageIOService::load_image(&io.input)?;
            let bytes = client.remove_background(image.as_bytes()).await?;
            let result = RasterImage::from_bytes(bytes)?;
            write_output(&result, io, "nobg", &config)
        },
        Command::Upscale { io, factor } => {
            let client = SrganClient::new(&config)?;
            let image = ImageIOService::load_image(&io.input)?;
            let bytes = client.upscale(image.as_bytes(), *factor).await?;
            let result = RasterImage::from_bytes(bytes)?;
            write_output(&result, io, "upscaled", &config)
        },
    }
}

/// Turn optional width/height/percentage arguments into a resize spec
fn resize_spec(
    width: Option<u32>,
    height: Option<u32>,
    percentage: Option<f32>,
) -> Result<ResizeSpec> {
    match (width, height, percentage) {
        (None, None, Some(pct)) => Ok(ResizeSpec::Percentage(pct)),
        (Some(w), Some(h), None) => Ok(ResizeSpec::Exact {
            width: w,
            height: h,
        }),
        (Some(w), None, None) => Ok(ResizeSpec::Width(w)),
        (None, Some(h), None) => Ok(ResizeSpec::Height(h)),
        (None, None, None) => anyhow::bail!("specify --width, --height, or --percentage"),
        _ => anyhow::bail!("--percentage cannot be combined with --width/--height"),
    }
}

fn write_output(
    result: &RasterImage,
    io: &IoArgs,
    suffix: &str,
    config: &EditorConfig,
) -> Result<()> {
    let output = io.output.clone().unwrap_or_else(|| {
        ImageIOService::derive_output_path(&io.input, suffix, config.output_format)
    });
    ImageIOService::save_image(result, &output)?;
    info!(
        "Wrote {} ({}x{}, {} bytes)",
        output.display(),
        result.width(),
        result.height(),
        result.byte_len()
    );
    println!("{}", output.display());
    Ok(())
}

/// Map `-v` counts onto a tracing filter and install the subscriber
fn init_tracing(verbose: u8) -> Result<()> {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(verbose >= 2)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;
    Ok(())
}
