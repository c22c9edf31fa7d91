//! Cheap live previews for adjustment changes
//!
//! The exact compositor re-rasterizes the full image for every committed edit.
//! During the interactive adjust flow that is too slow, so this module builds
//! the same conceptual pipeline (brightness, contrast, saturation, named
//! filter) out of composable filter primitives, collapses them into a single
//! color matrix, and applies that matrix to a small cached proxy of the
//! working image.
//!
//! The result is visually equivalent to the exact operation, not
//! byte-identical: the compositor clamps between stages while the preview
//! applies one affine transform, and the proxy is downscaled. Frontends that
//! render through CSS can use [`PreviewFilter::css_filter_string`] instead and
//! skip rasterization entirely.

use crate::geometry::{EditAdjustments, FilterKind};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

/// Longest edge of the preview proxy
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// Luminance weights shared with the exact pipeline
const LUMA_R: f32 = 0.213;
const LUMA_G: f32 = 0.715;
const LUMA_B: f32 = 0.072;

/// 4x5 color matrix: rows are output R/G/B/A, columns input R/G/B/A plus offset
type ColorMatrix = [[f32; 5]; 4];

const IDENTITY: ColorMatrix = [
    [1.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0],
];

/// One composable stage of the preview filter graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterPrimitive {
    /// Linear channel scale, slope `1 + brightness/100`
    Brightness(f32),
    /// Affine contrast around mid-gray, slope `1 + contrast/100`
    Contrast(f32),
    /// Saturation matrix, factor `1 + saturation/100`
    Saturate(f32),
    /// Fixed color matrix for a named filter
    NamedFilter(FilterKind),
}

impl FilterPrimitive {
    fn matrix(self) -> ColorMatrix {
        match self {
            Self::Brightness(slope) => scale_matrix(slope),
            Self::Contrast(slope) => {
                let intercept = 0.5 * (1.0 - slope);
                let mut m = scale_matrix(slope);
                m[0][4] = intercept;
                m[1][4] = intercept;
                m[2][4] = intercept;
                m
            },
            Self::Saturate(factor) => saturate_matrix(factor),
            Self::NamedFilter(kind) => match kind {
                FilterKind::None => IDENTITY,
                FilterKind::Grayscale => saturate_matrix(0.0),
                FilterKind::Sepia => [
                    [0.393, 0.769, 0.189, 0.0, 0.0],
                    [0.349, 0.686, 0.168, 0.0, 0.0],
                    [0.272, 0.534, 0.131, 0.0, 0.0],
                    [0.0, 0.0, 0.0, 1.0, 0.0],
                ],
                FilterKind::Invert => [
                    [-1.0, 0.0, 0.0, 0.0, 1.0],
                    [0.0, -1.0, 0.0, 0.0, 1.0],
                    [0.0, 0.0, -1.0, 0.0, 1.0],
                    [0.0, 0.0, 0.0, 1.0, 0.0],
                ],
            },
        }
    }
}

fn scale_matrix(scale: f32) -> ColorMatrix {
    [
        [scale, 0.0, 0.0, 0.0, 0.0],
        [0.0, scale, 0.0, 0.0, 0.0],
        [0.0, 0.0, scale, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
    ]
}

fn saturate_matrix(factor: f32) -> ColorMatrix {
    let inv = 1.0 - factor;
    [
        [
            LUMA_R * inv + factor,
            LUMA_G * inv,
            LUMA_B * inv,
            0.0,
            0.0,
        ],
        [
            LUMA_R * inv,
            LUMA_G * inv + factor,
            LUMA_B * inv,
            0.0,
            0.0,
        ],
        [
            LUMA_R * inv,
            LUMA_G * inv,
            LUMA_B * inv + factor,
            0.0,
            0.0,
        ],
        [0.0, 0.0, 0.0, 1.0, 0.0],
    ]
}

/// `second * first`: the matrix applying `first` then `second`
fn compose(second: &ColorMatrix, first: &ColorMatrix) -> ColorMatrix {
    let mut out = [[0.0f32; 5]; 4];
    for (row_index, row) in out.iter_mut().enumerate() {
        for col in 0..5 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += second[row_index][k] * first[k][col];
            }
            if col == 4 {
                sum += second[row_index][4];
            }
            row[col] = sum;
        }
    }
    out
}

/// The declared filter pipeline for one `EditAdjustments` value
///
/// Primitives are kept in application order (brightness, contrast, saturation,
/// named filter) and pre-collapsed into a single color matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFilter {
    primitives: Vec<FilterPrimitive>,
    matrix: ColorMatrix,
}

impl PreviewFilter {
    /// Build the filter graph for the given adjustments
    #[must_use]
    pub fn from_adjustments(adjustments: EditAdjustments) -> Self {
        let adjustments = adjustments.clamped();
        let mut primitives = Vec::with_capacity(4);
        if adjustments.brightness != 0 {
            primitives.push(FilterPrimitive::Brightness(
                1.0 + adjustments.brightness as f32 / 100.0,
            ));
        }
        if adjustments.contrast != 0 {
            primitives.push(FilterPrimitive::Contrast(
                1.0 + adjustments.contrast as f32 / 100.0,
            ));
        }
        if adjustments.saturation != 0 {
            primitives.push(FilterPrimitive::Saturate(
                1.0 + adjustments.saturation as f32 / 100.0,
            ));
        }
        if adjustments.filter != FilterKind::None {
            primitives.push(FilterPrimitive::NamedFilter(adjustments.filter));
        }

        let mut matrix = IDENTITY;
        for primitive in &primitives {
            matrix = compose(&primitive.matrix(), &matrix);
        }

        Self { primitives, matrix }
    }

    /// The composed stages, in application order
    #[must_use]
    pub fn primitives(&self) -> &[FilterPrimitive] {
        &self.primitives
    }

    /// True when this filter leaves pixels unchanged
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Transform one pixel through the composed matrix
    #[must_use]
    pub fn transform_pixel(&self, pixel: Rgba<u8>) -> Rgba<u8> {
        let input = [
            f32::from(pixel[0]) / 255.0,
            f32::from(pixel[1]) / 255.0,
            f32::from(pixel[2]) / 255.0,
            f32::from(pixel[3]) / 255.0,
        ];
        let mut output = [0.0f32; 4];
        for (channel, row) in self.matrix.iter().enumerate() {
            output[channel] = (row[0] * input[0]
                + row[1] * input[1]
                + row[2] * input[2]
                + row[3] * input[3]
                + row[4])
                .clamp(0.0, 1.0);
        }
        Rgba([
            (output[0] * 255.0).round() as u8,
            (output[1] * 255.0).round() as u8,
            (output[2] * 255.0).round() as u8,
            (output[3] * 255.0).round() as u8,
        ])
    }

    /// Apply the composed matrix to an existing decoded image reference
    #[must_use]
    pub fn apply_to(&self, source: &RgbaImage) -> RgbaImage {
        if self.is_identity() {
            return source.clone();
        }
        let mut out = source.clone();
        for pixel in out.pixels_mut() {
            *pixel = self.transform_pixel(*pixel);
        }
        out
    }

    /// CSS filter declaration equivalent to this pipeline
    ///
    /// Mirrors the canvas pipeline stage for stage so a CSS-rendering frontend
    /// shows the same visual result the compositor will commit.
    #[must_use]
    pub fn css_filter_string(&self) -> String {
        if self.primitives.is_empty() {
            return "none".to_string();
        }
        let parts: Vec<String> = self
            .primitives
            .iter()
            .map(|primitive| match primitive {
                FilterPrimitive::Brightness(slope) => {
                    format!("brightness({}%)", (slope * 100.0).round() as i32)
                },
                FilterPrimitive::Contrast(slope) => {
                    format!("contrast({}%)", (slope * 100.0).round() as i32)
                },
                FilterPrimitive::Saturate(factor) => {
                    format!("saturate({}%)", (factor * 100.0).round() as i32)
                },
                FilterPrimitive::NamedFilter(kind) => match kind {
                    FilterKind::Grayscale => "grayscale(100%)".to_string(),
                    FilterKind::Sepia => "sepia(100%)".to_string(),
                    FilterKind::Invert => "invert(100%)".to_string(),
                    FilterKind::None => String::new(),
                },
            })
            .filter(|part| !part.is_empty())
            .collect();
        parts.join(" ")
    }
}

/// Downscaled decoded copy of the working image that previews are drawn from
///
/// Built once per working image and reused across adjustment changes; replaced
/// wholesale (dropping the old buffer) when the working image is superseded.
#[derive(Debug, Clone)]
pub struct PreviewProxy {
    pixels: RgbaImage,
    source_dimensions: (u32, u32),
}

impl PreviewProxy {
    /// Downscale the decoded working image to the preview proxy size
    #[must_use]
    pub fn from_image(image: &DynamicImage) -> Self {
        let source_dimensions = (image.width(), image.height());
        let pixels = if image.width() <= PREVIEW_MAX_EDGE && image.height() <= PREVIEW_MAX_EDGE {
            image.to_rgba8()
        } else {
            // Triangle filtering is plenty for a throwaway preview
            image
                .resize(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE, FilterType::Triangle)
                .to_rgba8()
        };
        Self {
            pixels,
            source_dimensions,
        }
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Dimensions of the full-resolution image this proxy stands in for
    #[must_use]
    pub fn source_dimensions(&self) -> (u32, u32) {
        self.source_dimensions
    }
}

/// One rendered preview, tagged with the request generation that produced it
///
/// A frame whose generation is older than the latest request is stale and must
/// be discarded rather than displayed.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub image: RgbaImage,
    pub generation: u64,
}

impl PreviewFrame {
    /// Render a preview of `adjustments` against the proxy
    #[must_use]
    pub fn render(proxy: &PreviewProxy, adjustments: EditAdjustments, generation: u64) -> Self {
        let filter = PreviewFilter::from_adjustments(adjustments);
        Self {
            image: filter.apply_to(proxy.pixels()),
            generation,
        }
    }
}
