//! Pure value types describing pending transformations
//!
//! Nothing in this module touches pixel data. Crop rectangles, resize
//! specifications, and adjustment tuples are validated or resolved here and
//! then handed to the compositor or preview pipeline.

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Crop rectangle in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropArea {
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Validate the rectangle against the source dimensions
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidCrop` for zero-sized rectangles or
    /// rectangles extending past the source bounds.
    pub fn validate(&self, bounds: (u32, u32)) -> Result<()> {
        let (source_width, source_height) = bounds;
        if self.width == 0 || self.height == 0 {
            return Err(EditorError::invalid_crop(format!(
                "crop rectangle must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        // Checked arithmetic so a rectangle near u32::MAX cannot wrap
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        match (right, bottom) {
            (Some(r), Some(b)) if r <= source_width && b <= source_height => Ok(()),
            _ => Err(EditorError::invalid_crop(format!(
                "crop {}x{}+{}+{} exceeds source bounds {}x{}",
                self.width, self.height, self.x, self.y, source_width, source_height
            ))),
        }
    }
}

/// Target dimensions for a resize operation
///
/// A single-axis spec computes the missing side from the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResizeSpec {
    /// Uniform scale as a percentage of the source (100.0 = identity)
    Percentage(f32),
    /// Explicit output dimensions, aspect ratio not preserved
    Exact { width: u32, height: u32 },
    /// Fixed width, height computed preserving aspect ratio
    Width(u32),
    /// Fixed height, width computed preserving aspect ratio
    Height(u32),
}

impl ResizeSpec {
    /// Resolve the spec against source dimensions into concrete output dimensions
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidResize` when the spec or the source would
    /// produce a zero or non-finite dimension.
    pub fn resolve(&self, bounds: (u32, u32)) -> Result<(u32, u32)> {
        let (source_width, source_height) = bounds;
        if source_width == 0 || source_height == 0 {
            return Err(EditorError::invalid_resize(format!(
                "source has degenerate dimensions {}x{}",
                source_width, source_height
            )));
        }

        let (width, height) = match *self {
            Self::Percentage(pct) => {
                if !pct.is_finite() || pct <= 0.0 {
                    return Err(EditorError::invalid_resize(format!(
                        "percentage must be a positive finite number, got {}",
                        pct
                    )));
                }
                let factor = pct / 100.0;
                (
                    (source_width as f32 * factor).round() as u32,
                    (source_height as f32 * factor).round() as u32,
                )
            },
            Self::Exact { width, height } => (width, height),
            Self::Width(width) => {
                let ratio = source_height as f32 / source_width as f32;
                (width, (width as f32 * ratio).round() as u32)
            },
            Self::Height(height) => {
                let ratio = source_width as f32 / source_height as f32;
                ((height as f32 * ratio).round() as u32, height)
            },
        };

        if width == 0 || height == 0 {
            return Err(EditorError::invalid_resize(format!(
                "resolved dimensions {}x{} are degenerate",
                width, height
            )));
        }
        Ok((width, height))
    }
}

/// Named color filters selectable in the edit flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Grayscale => write!(f, "grayscale"),
            Self::Sepia => write!(f, "sepia"),
            Self::Invert => write!(f, "invert"),
        }
    }
}

impl FromStr for FilterKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "grayscale" => Ok(Self::Grayscale),
            "sepia" => Ok(Self::Sepia),
            "invert" => Ok(Self::Invert),
            other => Err(EditorError::invalid_config(format!(
                "unknown filter '{}' (expected none, grayscale, sepia, or invert)",
                other
            ))),
        }
    }
}

/// One non-destructive adjustment step
///
/// Brightness, contrast, and saturation are integers in `[-100, 100]` where 0
/// means no change. The default value is the identity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditAdjustments {
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub filter: FilterKind,
}

impl EditAdjustments {
    #[must_use]
    pub fn new(brightness: i32, contrast: i32, saturation: i32, filter: FilterKind) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            filter,
        }
    }

    /// True when applying this adjustment would leave every pixel unchanged
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.brightness == 0
            && self.contrast == 0
            && self.saturation == 0
            && self.filter == FilterKind::None
    }

    /// Clamp each channel adjustment into the supported `[-100, 100]` range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            brightness: self.brightness.clamp(-100, 100),
            contrast: self.contrast.clamp(-100, 100),
            saturation: self.saturation.clamp(-100, 100),
            filter: self.filter,
        }
    }
}
