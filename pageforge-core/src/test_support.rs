//! Shared fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::document::PdfFile;
use crate::operations::OperationResult;
use crate::raster::PageRasterizer;

/// Build an in-memory PDF with `page_count` US Letter pages, each carrying a
/// small identifying text stream.
pub(crate) fn sample_pdf(page_count: usize) -> Vec<u8> {
    sample_pdf_with_size(page_count, 612.0, 792.0)
}

/// Like [`sample_pdf`] with an explicit page size.
pub(crate) fn sample_pdf_with_size(page_count: usize, width: f64, height: f64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut page_ids = Vec::new();
    for page_number in 1..=page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new(
                    "Td",
                    vec![Object::Integer(72), Object::Integer(720)],
                ),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Sample page {page_number}").into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("encode content"),
        ));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width as f32),
                    Object::Real(height as f32),
                ]),
            ),
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_count as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize sample pdf");
    buffer
}

/// Deterministic rasterizer that paints every page a flat white, sized from
/// the page's media box. Stands in for a real rendering backend in tests.
pub(crate) struct FlatRasterizer;

impl PageRasterizer for FlatRasterizer {
    fn render_page(
        &mut self,
        data: &[u8],
        index: usize,
        scale: f32,
    ) -> OperationResult<image::RgbImage> {
        let file = PdfFile::load(data)?;
        let (width, height) = file.page_size(index)?;
        let px_w = (width * f64::from(scale)).ceil().max(1.0) as u32;
        let px_h = (height * f64::from(scale)).ceil().max(1.0) as u32;
        Ok(image::RgbImage::from_pixel(
            px_w,
            px_h,
            image::Rgb([255, 255, 255]),
        ))
    }
}

/// A rasterizer that always fails, for exercising error paths.
pub(crate) struct FailingRasterizer;

impl PageRasterizer for FailingRasterizer {
    fn render_page(
        &mut self,
        _data: &[u8],
        _index: usize,
        _scale: f32,
    ) -> OperationResult<image::RgbImage> {
        Err(crate::operations::OperationError::Codec(
            "backend unavailable".to_string(),
        ))
    }
}
