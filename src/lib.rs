#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # snapedit
//!
//! Client-side engine of a photo-editing application: exact canvas-style
//! compositing (crop, resize, colour adjustments, background compositing,
//! watermark stamping), a cheap live-preview pipeline, an edit-session state
//! machine, a monetization gate, and async clients for the remote
//! background-removal and upscaling services.
//!
//! ## Features
//!
//! - **Exact compositing**: crop, Lanczos3 resize, per-pixel adjustment
//!   pipeline (brightness, contrast, saturation, named filters), background
//!   compositing with cover-fit scaling, watermark stamping
//! - **Live previews**: adjustments collapsed into a single 4x5 color matrix
//!   applied to a downscaled proxy, with CSS `filter` string rendering for
//!   embedding frontends
//! - **Edit sessions**: explicit state machine with crop/resize/adjust
//!   sub-flows, one operation in flight at a time, progress reporting
//! - **Remote services**: background removal (remove.bg-style) and
//!   super-resolution (torch-srgan-style) behind async traits
//! - **Monetization**: free/premium gating with rewarded-ad unlocking
//! - **CLI Integration**: optional command-line interface (enable with the
//!   `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use snapedit::{
//!     CropArea, EditAdjustments, EditorConfig, EditSession, FilterKind, ResizeSpec,
//! };
//!
//! # fn example(photo_bytes: Vec<u8>) -> snapedit::Result<()> {
//! let mut session = EditSession::new(EditorConfig::default());
//! session.select_image(photo_bytes, "photo.jpg")?;
//!
//! session.begin_crop()?;
//! session.confirm_crop(CropArea::new(100, 100, 400, 300))?;
//!
//! session.begin_adjust()?;
//! session.confirm_adjust(EditAdjustments::new(10, 5, 0, FilterKind::None))?;
//!
//! session.begin_resize()?;
//! session.confirm_resize(ResizeSpec::Width(200))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Library vs CLI Usage
//!
//! All compositing and session functionality is available by default; enable
//! the `cli` feature for the `snapedit` binary:
//!
//! ```toml
//! [dependencies]
//! snapedit = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod monetize;
pub mod preview;
pub mod remote;
pub mod services;
pub mod session;
pub mod types;

// Public API exports
pub use compositor::Compositor;
pub use config::{EditorConfig, EditorConfigBuilder, OutputFormat, WatermarkConfig};
pub use error::{EditorError, Result};
pub use geometry::{CropArea, EditAdjustments, FilterKind, ResizeSpec};
pub use monetize::{AccountTier, GateDecision, GatedAction, MonetizationGate};
pub use preview::{PreviewFilter, PreviewFrame, PreviewProxy, PREVIEW_MAX_EDGE};
pub use remote::{
    BackgroundRemover, RemoveBgClient, RewardOutcome, RewardedAdProvider, SrganClient,
    UpscaleFactor, Upscaler,
};
pub use services::{
    ConsoleProgressReporter, EditStage, ImageIOService, NoOpProgressReporter, OutputFormatHandler,
    ProgressReporter, ProgressTracker, ProgressUpdate,
};
pub use session::{EditSession, Gated, SessionState};
pub use types::{Background, EditMetadata, EditTimings, RasterImage};

/// Apply crop, adjustment, and resize steps to encoded image bytes
///
/// Convenience wrapper for one-shot edits without driving a session: each
/// `Some` step runs through the exact compositor in order (crop, adjust,
/// resize) and the result is re-encoded per `config`.
///
/// # Examples
///
/// ```rust,no_run
/// use snapedit::{edit_image_bytes, CropArea, EditorConfig};
///
/// # fn example(bytes: Vec<u8>) -> snapedit::Result<()> {
/// let config = EditorConfig::default();
/// let cropped = edit_image_bytes(
///     &bytes,
///     Some(CropArea::new(0, 0, 100, 100)),
///     None,
///     None,
///     &config,
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn edit_image_bytes(
    image_bytes: &[u8],
    crop: Option<CropArea>,
    adjustments: Option<EditAdjustments>,
    resize: Option<ResizeSpec>,
    config: &EditorConfig,
) -> Result<RasterImage> {
    let compositor = Compositor::from_config(config);
    let mut image = RasterImage::from_bytes(image_bytes.to_vec())?;
    if let Some(area) = crop {
        image = compositor.crop(&image, area)?;
    }
    if let Some(adj) = adjustments {
        image = compositor.apply_adjustments(&image, adj)?;
    }
    if let Some(spec) = resize {
        image = compositor.resize(&image, spec)?;
    }
    Ok(image)
}

/// Remove the background of encoded image bytes via a configured client
///
/// Builds a `RemoveBgClient` from `config` and returns the service's cut-out
/// re-validated as a `RasterImage`.
pub async fn remove_background_from_bytes(
    image_bytes: &[u8],
    config: &EditorConfig,
) -> Result<RasterImage> {
    let client = RemoveBgClient::new(config)?;
    let bytes = client.remove_background(image_bytes).await?;
    RasterImage::from_bytes(bytes)
}

/// Upscale encoded image bytes via a configured client
pub async fn upscale_from_bytes(
    image_bytes: &[u8],
    factor: UpscaleFactor,
    config: &EditorConfig,
) -> Result<RasterImage> {
    let client = SrganClient::new(config)?;
    let bytes = client.upscale(image_bytes, factor).await?;
    RasterImage::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn sample_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([50, 100, 150, 255]),
        ));
        RasterImage::from_image(&image, OutputFormat::Png, 100)
            .unwrap()
            .into_bytes()
    }

    #[test]
    fn test_edit_image_bytes_pipeline() {
        let config = EditorConfig::default();
        let result = edit_image_bytes(
            &sample_bytes(800, 600),
            Some(CropArea::new(100, 100, 400, 300)),
            Some(EditAdjustments::new(10, 0, 0, FilterKind::None)),
            Some(ResizeSpec::Width(200)),
            &config,
        )
        .unwrap();
        assert_eq!(result.dimensions(), (200, 150));
    }

    #[test]
    fn test_edit_image_bytes_no_steps_reencodes() {
        let config = EditorConfig::default();
        let result = edit_image_bytes(&sample_bytes(64, 48), None, None, None, &config).unwrap();
        assert_eq!(result.dimensions(), (64, 48));
    }
}
