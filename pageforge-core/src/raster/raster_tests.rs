use super::*;
use crate::test_support::{sample_pdf, sample_pdf_with_size, FailingRasterizer, FlatRasterizer};

#[test]
fn test_render_pages_dimensions_follow_dpi() {
    let pdf = sample_pdf(2);
    let options = RenderOptions {
        dpi: 144.0,
        ..RenderOptions::default()
    };
    let pages = render_pages(&pdf, &options, &mut FlatRasterizer).unwrap();
    assert_eq!(pages.len(), 2);
    // 612 x 792 points at 2x
    assert_eq!(pages[0].width, 1224);
    assert_eq!(pages[0].height, 1584);
    assert_eq!(pages[0].index, 0);
    assert_eq!(pages[1].index, 1);
}

#[test]
fn test_redaction_is_burned_into_pixels() {
    let pdf = sample_pdf_with_size(1, 200.0, 300.0);
    let mut redactions = BTreeMap::new();
    redactions.insert(0, vec![Rect::new(50.0, 100.0, 40.0, 30.0)]);

    let options = RenderOptions {
        dpi: 72.0,
        redactions,
        ..RenderOptions::default()
    };
    let pages = render_pages(&pdf, &options, &mut FlatRasterizer).unwrap();
    let img = image::load_from_memory(&pages[0].bytes).unwrap().to_rgb8();

    // PDF-space (50, 100) with height 30 on a 300pt page maps to pixel rows
    // 170..200 (Y flipped), columns 50..90.
    assert_eq!(img.get_pixel(60, 180), &image::Rgb([0, 0, 0]));
    assert_eq!(img.get_pixel(89, 199), &image::Rgb([0, 0, 0]));
    // Outside the box stays untouched
    assert_eq!(img.get_pixel(10, 10), &image::Rgb([255, 255, 255]));
    assert_eq!(img.get_pixel(60, 220), &image::Rgb([255, 255, 255]));
}

#[test]
fn test_redaction_applies_only_to_its_page() {
    let pdf = sample_pdf_with_size(2, 100.0, 100.0);
    let mut redactions = BTreeMap::new();
    redactions.insert(1, vec![Rect::new(0.0, 0.0, 100.0, 100.0)]);

    let options = RenderOptions {
        dpi: 72.0,
        redactions,
        ..RenderOptions::default()
    };
    let pages = render_pages(&pdf, &options, &mut FlatRasterizer).unwrap();

    let first = image::load_from_memory(&pages[0].bytes).unwrap().to_rgb8();
    let second = image::load_from_memory(&pages[1].bytes).unwrap().to_rgb8();
    assert_eq!(first.get_pixel(50, 50), &image::Rgb([255, 255, 255]));
    assert_eq!(second.get_pixel(50, 50), &image::Rgb([0, 0, 0]));
}

#[test]
fn test_rebuild_from_images_sizes_pages_to_pixels() {
    let pdf = sample_pdf_with_size(2, 100.0, 150.0);
    let pages = render_pages(&pdf, &RenderOptions::default(), &mut FlatRasterizer).unwrap();
    let rebuilt = rebuild_from_images(&pages).unwrap();

    let file = crate::document::PdfFile::load(&rebuilt).unwrap();
    assert_eq!(file.page_count(), 2);
    let (w, h) = file.page_size(0).unwrap();
    assert_eq!(w as u32, pages[0].width);
    assert_eq!(h as u32, pages[0].height);
}

#[test]
fn test_rebuild_rejects_empty_input() {
    assert!(matches!(
        rebuild_from_images(&[]),
        Err(OperationError::EmptySelection(_))
    ));
}

#[test]
fn test_redact_requires_regions() {
    let pdf = sample_pdf(1);
    let empty = BTreeMap::new();
    assert!(matches!(
        redact(&pdf, &empty, 150.0, &mut FlatRasterizer),
        Err(OperationError::EmptySelection(_))
    ));

    let mut hollow = BTreeMap::new();
    hollow.insert(0usize, Vec::new());
    assert!(matches!(
        redact(&pdf, &hollow, 150.0, &mut FlatRasterizer),
        Err(OperationError::EmptySelection(_))
    ));
}

#[test]
fn test_redact_produces_image_only_document() {
    let pdf = sample_pdf(2);
    let mut redactions = BTreeMap::new();
    redactions.insert(0, vec![Rect::new(10.0, 10.0, 50.0, 20.0)]);

    let out = redact(&pdf, &redactions, 96.0, &mut FlatRasterizer).unwrap();
    let file = crate::document::PdfFile::load(&out).unwrap();
    assert_eq!(file.page_count(), 2);
}

#[test]
fn test_compress_returns_smallest_candidate() {
    let pdf = sample_pdf(3);

    let structural = crate::document::PdfFile::load(&pdf).unwrap().save().unwrap();
    let options = RenderOptions {
        dpi: 96.0,
        format: RenderFormat::Jpeg,
        jpeg_quality: quality_for_dpi(96.0),
        ..RenderOptions::default()
    };
    let rasterized = render_pages(&pdf, &options, &mut FlatRasterizer)
        .and_then(|pages| rebuild_from_images(&pages))
        .unwrap();

    let chosen = compress(&pdf, 96.0, &mut FlatRasterizer).unwrap();
    assert_eq!(chosen.len(), structural.len().min(rasterized.len()));
    assert!(chosen.len() <= structural.len());
    assert!(chosen.len() <= rasterized.len());
}

#[test]
fn test_compress_survives_rasterizer_failure() {
    let pdf = sample_pdf(2);
    let out = compress(&pdf, 150.0, &mut FailingRasterizer).unwrap();
    let file = crate::document::PdfFile::load(&out).unwrap();
    assert_eq!(file.page_count(), 2);
}

#[test]
fn test_quality_for_dpi_interpolates() {
    assert!((quality_for_dpi(72.0) - COMPRESS_QUALITY_FLOOR).abs() < 1e-6);
    assert!((quality_for_dpi(300.0) - COMPRESS_QUALITY_CEILING).abs() < 1e-6);
    let mid = quality_for_dpi(186.0);
    assert!(mid > COMPRESS_QUALITY_FLOOR && mid < COMPRESS_QUALITY_CEILING);
    // outside the span the endpoints hold
    assert!((quality_for_dpi(10.0) - COMPRESS_QUALITY_FLOOR).abs() < 1e-6);
    assert!((quality_for_dpi(1200.0) - COMPRESS_QUALITY_CEILING).abs() < 1e-6);
}

#[test]
fn test_grayscale_renders_monochrome_jpegs() {
    let pdf = sample_pdf(2);
    let out = grayscale(&pdf, 96.0, 0.8, &mut FlatRasterizer).unwrap();
    let file = crate::document::PdfFile::load(&out).unwrap();
    assert_eq!(file.page_count(), 2);
}

#[test]
fn test_grayscale_quality_is_clamped() {
    let pdf = sample_pdf(1);
    assert!(grayscale(&pdf, 96.0, 99.0, &mut FlatRasterizer).is_ok());
    assert!(grayscale(&pdf, 96.0, -1.0, &mut FlatRasterizer).is_ok());
}
