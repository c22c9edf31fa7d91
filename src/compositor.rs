//! Exact raster compositing operations
//!
//! This module produces final-quality output images by decoding the source,
//! drawing through the `image` crate, and re-encoding. It is the committed-edit
//! counterpart of the cheap [`crate::preview`] pipeline: previews approximate,
//! the compositor is authoritative.
//!
//! Every operation allocates a new image; sources are only borrowed, so a
//! failed operation can never leave partially mutated state behind.

use crate::config::{EditorConfig, OutputFormat, WatermarkConfig};
use crate::error::{EditorError, Result};
use crate::geometry::{CropArea, EditAdjustments, FilterKind, ResizeSpec};
use crate::types::{Background, RasterImage};
use ab_glyph::{Font, FontArc, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use instant::Instant;
use tracing::debug;

/// Luminance weights used by CSS `saturate()`/`grayscale()` color matrices
const LUMA_R: f32 = 0.213;
const LUMA_G: f32 = 0.715;
const LUMA_B: f32 = 0.072;

/// Pixel margin between the watermark badge and the image edge
const WATERMARK_MARGIN: u32 = 8;
/// Padding between the badge border and the text
const WATERMARK_PADDING: u32 = 6;

/// Exact, final-quality compositing operations
///
/// Carries the output encoding so every committed edit round-trips through the
/// same format and quality settings.
#[derive(Debug, Clone)]
pub struct Compositor {
    format: OutputFormat,
    quality: u8,
}

impl Compositor {
    #[must_use]
    pub fn new(format: OutputFormat, quality: u8) -> Self {
        Self { format, quality }
    }

    /// Build a compositor from the editor configuration
    #[must_use]
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.output_format, config.quality_for(config.output_format))
    }

    /// Extract the sub-rectangle `area` of the source, no resampling
    ///
    /// The output is exactly `area.width x area.height`.
    ///
    /// # Errors
    ///
    /// `InvalidCrop` for out-of-bounds geometry, `Decode` for unreadable
    /// source bytes.
    pub fn crop(&self, source: &RasterImage, area: CropArea) -> Result<RasterImage> {
        area.validate(source.dimensions())?;
        let start = Instant::now();
        let decoded = source.decode()?;
        let cropped = decoded.crop_imm(area.x, area.y, area.width, area.height);
        let result = self.encode(&cropped)?;
        debug!(
            width = area.width,
            height = area.height,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "crop committed"
        );
        Ok(result)
    }

    /// Resample the source to the dimensions resolved from `spec`
    ///
    /// Uses high-quality (Lanczos3) smoothing; this is a lossy operation even
    /// for an identity spec.
    pub fn resize(&self, source: &RasterImage, spec: ResizeSpec) -> Result<RasterImage> {
        let (width, height) = spec.resolve(source.dimensions())?;
        let start = Instant::now();
        let decoded = source.decode()?;
        let resized = decoded.resize_exact(width, height, FilterType::Lanczos3);
        let result = self.encode(&resized)?;
        debug!(
            width,
            height,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "resize committed"
        );
        Ok(result)
    }

    /// Apply brightness/contrast/saturation and the named filter exactly
    ///
    /// Stages run per pixel in a fixed order matching the live preview's
    /// declared pipeline: brightness, contrast, saturation, named filter.
    /// The identity adjustment returns a pixel-identical image. Alpha is never
    /// modified.
    pub fn apply_adjustments(
        &self,
        source: &RasterImage,
        adjustments: EditAdjustments,
    ) -> Result<RasterImage> {
        let adjustments = adjustments.clamped();
        let start = Instant::now();
        let decoded = source.decode()?;
        let mut rgba = decoded.to_rgba8();

        if !adjustments.is_identity() {
            for pixel in rgba.pixels_mut() {
                *pixel = adjust_pixel(*pixel, adjustments);
            }
        }

        let result = self.encode(&DynamicImage::ImageRgba8(rgba))?;
        debug!(
            brightness = adjustments.brightness,
            contrast = adjustments.contrast,
            saturation = adjustments.saturation,
            filter = %adjustments.filter,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "adjustments committed"
        );
        Ok(result)
    }

    /// Draw the background, then the subject on top unscaled at the origin
    ///
    /// Image backgrounds are scaled cover-fit (`scale = max(cw/bw, ch/bh)`)
    /// and centered so they fully cover the canvas.
    pub fn composite_background(
        &self,
        subject: &RasterImage,
        background: &Background,
    ) -> Result<RasterImage> {
        let start = Instant::now();
        let subject_image = subject.decode()?.to_rgba8();
        let (width, height) = subject_image.dimensions();

        let mut canvas = match background {
            Background::Transparent => RgbaImage::new(width, height),
            Background::Solid(color) => RgbaImage::from_pixel(width, height, *color),
            Background::Image(raster) => cover_fit(&raster.decode()?, width, height),
        };

        for (x, y, pixel) in subject_image.enumerate_pixels() {
            blend_over(canvas.get_pixel_mut(x, y), *pixel);
        }

        let result = self.encode(&DynamicImage::ImageRgba8(canvas))?;
        debug!(
            width,
            height,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "background composited"
        );
        Ok(result)
    }

    /// Stamp a translucent watermark near the bottom-left corner
    ///
    /// Purely cosmetic: the output always has the source's dimensions. Text is
    /// rasterized when `style` carries font bytes; otherwise only the
    /// translucent badge is drawn.
    pub fn stamp_watermark(
        &self,
        source: &RasterImage,
        style: &WatermarkConfig,
    ) -> Result<RasterImage> {
        let decoded = source.decode()?;
        let mut rgba = decoded.to_rgba8();
        draw_watermark(&mut rgba, style);
        self.encode(&DynamicImage::ImageRgba8(rgba))
    }

    /// Downscale so the longest edge is at most `max_edge`, preserving aspect
    ///
    /// Images already within the cap are returned unchanged (re-encoded only).
    /// Used for standard-quality exports and for pre-upload shrinking.
    pub fn downscale_to_fit(&self, source: &RasterImage, max_edge: u32) -> Result<RasterImage> {
        let (width, height) = source.dimensions();
        if width <= max_edge && height <= max_edge {
            return Ok(source.clone());
        }
        let spec = if width >= height {
            ResizeSpec::Width(max_edge)
        } else {
            ResizeSpec::Height(max_edge)
        };
        self.resize(source, spec)
    }

    fn encode(&self, image: &DynamicImage) -> Result<RasterImage> {
        RasterImage::from_image(image, self.format, self.quality)
    }
}

/// Apply the full adjustment pipeline to a single pixel
///
/// Shared fixed order with the preview pipeline: brightness, contrast,
/// saturation, named filter. Works in normalized f32, clamping between stages.
fn adjust_pixel(pixel: Rgba<u8>, adjustments: EditAdjustments) -> Rgba<u8> {
    let mut r = f32::from(pixel[0]) / 255.0;
    let mut g = f32::from(pixel[1]) / 255.0;
    let mut b = f32::from(pixel[2]) / 255.0;

    if adjustments.brightness != 0 {
        let scale = 1.0 + adjustments.brightness as f32 / 100.0;
        r = (r * scale).clamp(0.0, 1.0);
        g = (g * scale).clamp(0.0, 1.0);
        b = (b * scale).clamp(0.0, 1.0);
    }

    if adjustments.contrast != 0 {
        let scale = 1.0 + adjustments.contrast as f32 / 100.0;
        r = ((r - 0.5) * scale + 0.5).clamp(0.0, 1.0);
        g = ((g - 0.5) * scale + 0.5).clamp(0.0, 1.0);
        b = ((b - 0.5) * scale + 0.5).clamp(0.0, 1.0);
    }

    if adjustments.saturation != 0 {
        let scale = 1.0 + adjustments.saturation as f32 / 100.0;
        let luma = LUMA_R * r + LUMA_G * g + LUMA_B * b;
        r = (luma + (r - luma) * scale).clamp(0.0, 1.0);
        g = (luma + (g - luma) * scale).clamp(0.0, 1.0);
        b = (luma + (b - luma) * scale).clamp(0.0, 1.0);
    }

    match adjustments.filter {
        FilterKind::None => {},
        FilterKind::Grayscale => {
            let luma = LUMA_R * r + LUMA_G * g + LUMA_B * b;
            r = luma;
            g = luma;
            b = luma;
        },
        FilterKind::Sepia => {
            let (sr, sg, sb) = (r, g, b);
            r = (0.393 * sr + 0.769 * sg + 0.189 * sb).clamp(0.0, 1.0);
            g = (0.349 * sr + 0.686 * sg + 0.168 * sb).clamp(0.0, 1.0);
            b = (0.272 * sr + 0.534 * sg + 0.131 * sb).clamp(0.0, 1.0);
        },
        FilterKind::Invert => {
            r = 1.0 - r;
            g = 1.0 - g;
            b = 1.0 - b;
        },
    }

    Rgba([
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
        pixel[3],
    ])
}

/// Scale `background` so it fully covers a `width x height` canvas, centered,
/// cropping overflow
fn cover_fit(background: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let (bg_width, bg_height) = background.dimensions();
    if bg_width == 0 || bg_height == 0 {
        return RgbaImage::new(width, height);
    }

    let scale = (width as f32 / bg_width as f32).max(height as f32 / bg_height as f32);
    let scaled_width = ((bg_width as f32 * scale).round() as u32).max(width);
    let scaled_height = ((bg_height as f32 * scale).round() as u32).max(height);

    let scaled = background
        .resize_exact(scaled_width, scaled_height, FilterType::Lanczos3)
        .to_rgba8();

    let offset_x = (scaled_width - width) / 2;
    let offset_y = (scaled_height - height) / 2;

    let mut canvas = RgbaImage::new(width, height);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        *pixel = *scaled.get_pixel(x + offset_x, y + offset_y);
    }
    canvas
}

/// Source-over alpha blending of `src` onto `dst`
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let src_a = f32::from(src[3]) / 255.0;
    if src_a >= 1.0 {
        *dst = src;
        return;
    }
    if src_a <= 0.0 {
        return;
    }
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for channel in 0..3 {
        let s = f32::from(src[channel]) / 255.0;
        let d = f32::from(dst[channel]) / 255.0;
        let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        dst[channel] = (out * 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Draw the translucent badge and, when a font is available, the watermark text
fn draw_watermark(canvas: &mut RgbaImage, style: &WatermarkConfig) {
    let (width, height) = canvas.dimensions();
    let font = style
        .font_bytes
        .as_ref()
        .and_then(|bytes| FontArc::try_from_vec(bytes.clone()).ok());

    // Badge extents: measured from the font when present, estimated otherwise
    let text_width = match &font {
        Some(font) => measure_text(font, &style.text, style.font_size),
        None => style.text.chars().count() as f32 * style.font_size * 0.55,
    };
    let text_height = style.font_size;

    let badge_width = (text_width.ceil() as u32 + 2 * WATERMARK_PADDING).min(width);
    let badge_height = (text_height.ceil() as u32 + 2 * WATERMARK_PADDING).min(height);
    let badge_x = WATERMARK_MARGIN.min(width.saturating_sub(badge_width));
    let badge_y = height
        .saturating_sub(badge_height)
        .saturating_sub(WATERMARK_MARGIN);

    let badge_color = Rgba([0, 0, 0, 102]);
    for y in badge_y..(badge_y + badge_height).min(height) {
        for x in badge_x..(badge_x + badge_width).min(width) {
            blend_over(canvas.get_pixel_mut(x, y), badge_color);
        }
    }

    if let Some(font) = font {
        let origin_x = (badge_x + WATERMARK_PADDING) as f32;
        let baseline_y = (badge_y + WATERMARK_PADDING) as f32 + font.as_scaled(style.font_size).ascent();
        draw_text(
            canvas,
            &font,
            &style.text,
            style.font_size,
            origin_x,
            baseline_y,
            Rgba([255, 255, 255, 220]),
        );
    }
}

/// Advance width of a single line of text
fn measure_text(font: &FontArc, text: &str, font_size: f32) -> f32 {
    let scaled = font.as_scaled(font_size);
    let mut width = 0.0f32;
    let mut last_glyph = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }
    width
}

/// Rasterize one line of text onto the canvas with coverage blending
fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    font_size: f32,
    origin_x: f32,
    baseline_y: f32,
    color: Rgba<u8>,
) {
    let scaled = font.as_scaled(font_size);
    let (width, height) = canvas.dimensions();
    let mut cursor_x = origin_x;
    let mut last_glyph = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(font_size, ab_glyph::point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                    return;
                }
                let alpha = (f32::from(color[3]) * coverage).round() as u8;
                blend_over(
                    canvas.get_pixel_mut(px as u32, py as u32),
                    Rgba([color[0], color[1], color[2], alpha]),
                );
            });
        }
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FilterKind;

    fn compositor() -> Compositor {
        Compositor::new(OutputFormat::Png, 100)
    }

    fn gradient_image(width: u32, height: u32) -> RasterImage {
        let rgba = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
                255,
            ])
        });
        RasterImage::from_image(&DynamicImage::ImageRgba8(rgba), OutputFormat::Png, 100).unwrap()
    }

    #[test]
    fn test_crop_yields_exact_dimensions() {
        let source = gradient_image(800, 600);
        let area = CropArea::new(100, 100, 400, 300);
        let cropped = compositor().crop(&source, area).unwrap();
        assert_eq!(cropped.dimensions(), (400, 300));
    }

    #[test]
    fn test_crop_copies_source_region() {
        let source = gradient_image(100, 100);
        let cropped = compositor()
            .crop(&source, CropArea::new(10, 20, 30, 30))
            .unwrap();
        let original = source.decode().unwrap().to_rgba8();
        let result = cropped.decode().unwrap().to_rgba8();
        assert_eq!(result.get_pixel(0, 0), original.get_pixel(10, 20));
        assert_eq!(result.get_pixel(29, 29), original.get_pixel(39, 49));
    }

    #[test]
    fn test_crop_rejects_out_of_bounds() {
        let source = gradient_image(100, 100);
        let err = compositor()
            .crop(&source, CropArea::new(90, 0, 20, 20))
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidCrop(_)));
    }

    #[test]
    fn test_resize_identity_percentage() {
        let source = gradient_image(640, 480);
        let resized = compositor()
            .resize(&source, ResizeSpec::Percentage(100.0))
            .unwrap();
        assert_eq!(resized.dimensions(), (640, 480));
    }

    #[test]
    fn test_resize_width_preserves_aspect() {
        let source = gradient_image(400, 300);
        let resized = compositor().resize(&source, ResizeSpec::Width(200)).unwrap();
        assert_eq!(resized.dimensions(), (200, 150));
    }

    #[test]
    fn test_identity_adjustments_pixel_identical() {
        let source = gradient_image(32, 32);
        let adjusted = compositor()
            .apply_adjustments(&source, EditAdjustments::default())
            .unwrap();
        let before = source.decode().unwrap().to_rgba8();
        let after = adjusted.decode().unwrap().to_rgba8();
        assert_eq!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_brightness_scales_channels() {
        let pixel = Rgba([100, 100, 100, 255]);
        let brighter = adjust_pixel(pixel, EditAdjustments::new(50, 0, 0, FilterKind::None));
        assert_eq!(brighter, Rgba([150, 150, 150, 255]));
        let darker = adjust_pixel(pixel, EditAdjustments::new(-50, 0, 0, FilterKind::None));
        assert_eq!(darker, Rgba([50, 50, 50, 255]));
    }

    #[test]
    fn test_invert_filter() {
        let pixel = Rgba([10, 200, 55, 128]);
        let inverted = adjust_pixel(pixel, EditAdjustments::new(0, 0, 0, FilterKind::Invert));
        assert_eq!(inverted, Rgba([245, 55, 200, 128]));
    }

    #[test]
    fn test_grayscale_flattens_channels() {
        let pixel = Rgba([250, 10, 60, 255]);
        let gray = adjust_pixel(pixel, EditAdjustments::new(0, 0, 0, FilterKind::Grayscale));
        assert_eq!(gray[0], gray[1]);
        assert_eq!(gray[1], gray[2]);
        assert_eq!(gray[3], 255);
    }

    #[test]
    fn test_adjustments_never_touch_alpha() {
        let pixel = Rgba([40, 90, 160, 77]);
        let adjusted = adjust_pixel(pixel, EditAdjustments::new(80, -30, 60, FilterKind::Sepia));
        assert_eq!(adjusted[3], 77);
    }

    #[test]
    fn test_composite_solid_background_fills_transparent_pixels() {
        let subject = RgbaImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let subject =
            RasterImage::from_image(&DynamicImage::ImageRgba8(subject), OutputFormat::Png, 100)
                .unwrap();
        let background = Background::Solid(Rgba([0, 0, 255, 255]));
        let composed = compositor()
            .composite_background(&subject, &background)
            .unwrap();
        let pixels = composed.decode().unwrap().to_rgba8();
        assert_eq!(*pixels.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*pixels.get_pixel(3, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_composite_transparent_background_is_noop_on_pixels() {
        let source = gradient_image(16, 16);
        let composed = compositor()
            .composite_background(&source, &Background::Transparent)
            .unwrap();
        assert_eq!(composed.dimensions(), (16, 16));
        let before = source.decode().unwrap().to_rgba8();
        let after = composed.decode().unwrap().to_rgba8();
        assert_eq!(before.as_raw(), after.as_raw());
    }

    #[test]
    fn test_cover_fit_covers_canvas() {
        // Wide background onto a tall canvas: scale is driven by height
        let background = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            200,
            50,
            Rgba([9, 9, 9, 255]),
        ));
        let fitted = cover_fit(&background, 100, 100);
        assert_eq!(fitted.dimensions(), (100, 100));
        // Every pixel must be covered by the scaled background
        assert!(fitted.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_watermark_preserves_dimensions() {
        let source = gradient_image(120, 90);
        let stamped = compositor()
            .stamp_watermark(&source, &WatermarkConfig::default())
            .unwrap();
        assert_eq!(stamped.dimensions(), (120, 90));
    }

    #[test]
    fn test_watermark_darkens_badge_area() {
        let white = RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255]));
        let source =
            RasterImage::from_image(&DynamicImage::ImageRgba8(white), OutputFormat::Png, 100)
                .unwrap();
        let stamped = compositor()
            .stamp_watermark(&source, &WatermarkConfig::default())
            .unwrap();
        let pixels = stamped.decode().unwrap().to_rgba8();
        // A pixel inside the bottom-left badge must have been darkened
        let probe = pixels.get_pixel(WATERMARK_MARGIN + 2, 100 - WATERMARK_MARGIN - 4);
        assert!(probe[0] < 255);
    }

    #[test]
    fn test_downscale_to_fit_caps_longest_edge() {
        let source = gradient_image(2000, 1000);
        let capped = compositor().downscale_to_fit(&source, 1024).unwrap();
        assert_eq!(capped.dimensions(), (1024, 512));

        let small = gradient_image(300, 200);
        let untouched = compositor().downscale_to_fit(&small, 1024).unwrap();
        assert_eq!(untouched.dimensions(), (300, 200));
    }

    #[test]
    fn test_blend_over_opaque_src_replaces() {
        let mut dst = Rgba([1, 2, 3, 255]);
        blend_over(&mut dst, Rgba([200, 100, 50, 255]));
        assert_eq!(dst, Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_blend_over_half_alpha() {
        let mut dst = Rgba([0, 0, 0, 255]);
        blend_over(&mut dst, Rgba([255, 255, 255, 128]));
        // Roughly half-way between black and white
        assert!((125..=131).contains(&dst[0]));
        assert_eq!(dst[3], 255);
    }
}
