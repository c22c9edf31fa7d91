//! Error handling and edge case tests
//!
//! Exercises the error taxonomy across geometry validation, decoding, session
//! state guards, and configuration building.

use image::{DynamicImage, Rgba, RgbaImage};
use snapedit::{
    Background, Compositor, CropArea, EditAdjustments, EditSession, EditorConfig, EditorError,
    FilterKind, OutputFormat, RasterImage, ResizeSpec,
};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn raster(width: u32, height: u32) -> RasterImage {
    init_logging();
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([60, 60, 60, 255]),
    ));
    RasterImage::from_image(&image, OutputFormat::Png, 100).unwrap()
}

#[test]
fn test_corrupt_bytes_surface_decode_error() {
    let err = RasterImage::from_bytes(b"definitely not an image".to_vec()).unwrap_err();
    assert!(matches!(err, EditorError::Decode(_)));

    // Valid magic bytes with a truncated body also fail validation
    let mut truncated = raster(32, 32).into_bytes();
    truncated.truncate(20);
    assert!(RasterImage::from_bytes(truncated).is_err());
}

#[test]
fn test_crop_rejections_do_no_raster_work() {
    let compositor = Compositor::from_config(&EditorConfig::default());
    let source = raster(100, 100);

    for area in [
        CropArea::new(0, 0, 0, 10),
        CropArea::new(0, 0, 10, 0),
        CropArea::new(90, 0, 20, 10),
        CropArea::new(0, 90, 10, 20),
        CropArea::new(u32::MAX, 0, 1, 1),
    ] {
        let err = compositor.crop(&source, area).unwrap_err();
        assert!(matches!(err, EditorError::InvalidCrop(_)), "{:?}", area);
    }
}

#[test]
fn test_resize_rejections() {
    let compositor = Compositor::from_config(&EditorConfig::default());
    let source = raster(100, 100);

    for spec in [
        ResizeSpec::Percentage(0.0),
        ResizeSpec::Percentage(-50.0),
        ResizeSpec::Percentage(f32::NAN),
        ResizeSpec::Percentage(f32::INFINITY),
        ResizeSpec::Exact {
            width: 0,
            height: 10,
        },
    ] {
        let err = compositor.resize(&source, spec).unwrap_err();
        assert!(matches!(err, EditorError::InvalidResize(_)), "{:?}", spec);
    }

    // Percentage small enough to round a side to zero
    assert!(compositor
        .resize(&source, ResizeSpec::Percentage(0.1))
        .is_err());
}

#[test]
fn test_adjustments_clamp_out_of_range_values() {
    let compositor = Compositor::from_config(&EditorConfig::default());
    let source = raster(8, 8);

    // Out-of-range inputs are clamped, not rejected
    let clamped = compositor
        .apply_adjustments(
            &source,
            EditAdjustments::new(1000, -1000, 500, FilterKind::None),
        )
        .unwrap();
    let expected = compositor
        .apply_adjustments(
            &source,
            EditAdjustments::new(100, -100, 100, FilterKind::None),
        )
        .unwrap();
    assert_eq!(
        clamped.decode().unwrap().to_rgba8().as_raw(),
        expected.decode().unwrap().to_rgba8().as_raw()
    );
}

#[test]
fn test_background_hex_rejections() {
    for bad in ["", "#", "#fff", "#12345", "#1234567", "#zzzzzz", "red"] {
        let err = Background::solid_from_hex(bad).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)), "{}", bad);
    }
}

#[test]
fn test_session_guards() {
    let mut session = EditSession::new(EditorConfig::default());

    // Nothing works on an empty session
    assert!(matches!(
        session.begin_crop().unwrap_err(),
        EditorError::ConcurrentEdit(_)
    ));
    assert!(matches!(
        session.confirm_crop(CropArea::new(0, 0, 1, 1)).unwrap_err(),
        EditorError::ConcurrentEdit(_)
    ));
    assert!(session.compose_final(false).is_err());

    // Confirm without begin is rejected
    session
        .select_image(raster(64, 64).into_bytes(), "a.png")
        .unwrap();
    assert!(matches!(
        session.confirm_resize(ResizeSpec::Width(32)).unwrap_err(),
        EditorError::ConcurrentEdit(_)
    ));

    // Cross-flow confirm is rejected without leaving the active flow
    session.begin_crop().unwrap();
    assert!(matches!(
        session.confirm_resize(ResizeSpec::Width(32)).unwrap_err(),
        EditorError::ConcurrentEdit(_)
    ));
    session.confirm_crop(CropArea::new(0, 0, 32, 32)).unwrap();
    assert_eq!(session.working_image().unwrap().dimensions(), (32, 32));
}

#[test]
fn test_config_builder_rejections() {
    assert!(matches!(
        EditorConfig::builder().jpeg_quality(101).build().unwrap_err(),
        EditorError::InvalidConfig(_)
    ));
    assert!(EditorConfig::builder()
        .webp_quality(200)
        .build()
        .is_err());
    assert!(EditorConfig::builder()
        .upload_max_dimension(0)
        .build()
        .is_err());
    assert!(EditorConfig::builder()
        .remote_timeout(Duration::ZERO)
        .build()
        .is_err());
    assert!(EditorConfig::builder()
        .watermark_font_size(f32::NAN)
        .build()
        .is_err());
}

#[test]
fn test_errors_are_recoverable_except_internal() {
    assert!(EditorError::decode("bad").is_recoverable());
    assert!(EditorError::invalid_crop("bad").is_recoverable());
    assert!(EditorError::invalid_resize("bad").is_recoverable());
    assert!(EditorError::remote_service("bad").is_recoverable());
    assert!(EditorError::concurrent_edit("bad").is_recoverable());
    assert!(EditorError::invalid_config("bad").is_recoverable());
    assert!(!EditorError::internal("bug").is_recoverable());
}

#[test]
fn test_watermark_never_changes_dimensions() {
    let compositor = Compositor::from_config(&EditorConfig::default());

    for (width, height) in [(16, 16), (100, 40), (40, 100), (1024, 768)] {
        let stamped = compositor
            .stamp_watermark(&raster(width, height), &EditorConfig::default().watermark)
            .unwrap();
        assert_eq!(stamped.dimensions(), (width, height));
    }
}
