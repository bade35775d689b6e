//! Rasterize-based operations: redaction, compression and grayscale.
//!
//! These operations exist because their guarantees cannot be met by vector
//! edits: a redaction box drawn as vector content can be lifted back off the
//! page, while a box burned into pixels before image encoding cannot. The
//! actual page rendering is an external capability injected behind
//! [`PageRasterizer`]; everything downstream of the pixel buffer (burn-in,
//! color conversion, encoding, document rebuild) lives here.

pub mod worker;

pub use worker::RenderClient;

use std::collections::BTreeMap;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::{debug, warn};

use crate::document::PdfFile;
use crate::embed::{image_xobject, jpeg_xobject};
use crate::geometry::Rect;
use crate::operations::{OperationError, OperationResult};

/// Grayscale JPEG quality is clamped into this span.
const GRAYSCALE_QUALITY_SPAN: (f32, f32) = (0.35, 0.95);

/// Endpoints of the dpi-to-quality interpolation used by [`compress`].
const COMPRESS_QUALITY_FLOOR: f32 = 0.45;
const COMPRESS_QUALITY_CEILING: f32 = 0.85;
const COMPRESS_DPI_LOW: f32 = 72.0;
const COMPRESS_DPI_HIGH: f32 = 300.0;

/// The injected page-rendering capability.
///
/// Implementations rasterize one page of an in-memory document at the given
/// scale (1.0 means 72 dpi). They must be `Send` so a render worker can own
/// one on its own thread.
pub trait PageRasterizer: Send {
    fn render_page(
        &mut self,
        data: &[u8],
        index: usize,
        scale: f32,
    ) -> OperationResult<RgbImage>;
}

/// Output encoding for rendered pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    Png,
    Jpeg,
}

/// Options for [`render_pages`]
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Render resolution; pages are rasterized at `dpi / 72`
    pub dpi: f32,
    pub format: RenderFormat,
    /// JPEG quality in `(0, 1]`; ignored for PNG output
    pub jpeg_quality: f32,
    /// Convert to monochrome before encoding
    pub grayscale: bool,
    /// PDF-space rectangles to fill with solid black per page index,
    /// burned into the pixels before encoding
    pub redactions: BTreeMap<usize, Vec<Rect>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 150.0,
            format: RenderFormat::Png,
            jpeg_quality: 0.72,
            grayscale: false,
            redactions: BTreeMap::new(),
        }
    }
}

/// One rasterized page. Lives for a single operation invocation; never cached.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Zero-based index in the source document
    pub index: usize,
    /// Pixel dimensions of the encoded image
    pub width: u32,
    pub height: u32,
    pub format: RenderFormat,
    pub grayscale: bool,
    pub bytes: Vec<u8>,
}

/// Rasterize every page of a document.
///
/// Redaction rectangles are converted from PDF space into the render's pixel
/// space (including the Y flip) and filled with opaque black *before* the
/// image is encoded; the encoded output never contains the covered pixels.
pub fn render_pages(
    data: &[u8],
    options: &RenderOptions,
    rasterizer: &mut dyn PageRasterizer,
) -> OperationResult<Vec<RenderedPage>> {
    let file = PdfFile::load(data)?;
    let scale = (options.dpi / 72.0).max(1.0 / 72.0);

    let mut pages = Vec::with_capacity(file.page_count());
    for index in 0..file.page_count() {
        let mut img = rasterizer.render_page(data, index, scale)?;

        if let Some(rects) = options.redactions.get(&index) {
            let (_, page_height) = file.page_size(index)?;
            for rect in rects {
                burn_rect(&mut img, rect, page_height, f64::from(scale));
            }
        }

        let (width, height) = img.dimensions();
        let bytes = encode_image(img, options)?;
        pages.push(RenderedPage {
            index,
            width,
            height,
            format: options.format,
            grayscale: options.grayscale,
            bytes,
        });
    }

    debug!(pages = pages.len(), dpi = options.dpi, "rendered document");
    Ok(pages)
}

/// Fill one PDF-space rectangle with black in the pixel buffer.
fn burn_rect(img: &mut RgbImage, rect: &Rect, page_height: f64, scale: f64) {
    let x0 = (rect.x * scale).floor().max(0.0) as u32;
    let y0 = ((page_height - rect.y - rect.height) * scale).floor().max(0.0) as u32;
    let x1 = (((rect.x + rect.width) * scale).ceil() as u32).min(img.width());
    let y1 = ((((page_height - rect.y) * scale).ceil()) as u32).min(img.height());

    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
}

fn encode_image(img: RgbImage, options: &RenderOptions) -> OperationResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    match (options.format, options.grayscale) {
        (RenderFormat::Png, false) => {
            DynamicImage::ImageRgb8(img).write_to(&mut cursor, ImageFormat::Png)?;
        }
        (RenderFormat::Png, true) => {
            let luma = DynamicImage::ImageRgb8(img).to_luma8();
            DynamicImage::ImageLuma8(luma).write_to(&mut cursor, ImageFormat::Png)?;
        }
        (RenderFormat::Jpeg, false) => {
            let quality = (options.jpeg_quality.clamp(0.01, 1.0) * 100.0) as u8;
            let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
            encoder.encode_image(&img)?;
        }
        (RenderFormat::Jpeg, true) => {
            let quality = (options.jpeg_quality.clamp(0.01, 1.0) * 100.0) as u8;
            let luma = DynamicImage::ImageRgb8(img).to_luma8();
            let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
            encoder.encode_image(&luma)?;
        }
    }
    Ok(cursor.into_inner())
}

/// Build a document whose pages are exactly the rendered images.
///
/// Each page is sized to its image's pixel dimensions and draws the raster as
/// its entire content; the output carries no vector text layer.
pub fn rebuild_from_images(pages: &[RenderedPage]) -> OperationResult<Vec<u8>> {
    if pages.is_empty() {
        return Err(OperationError::EmptySelection("no rendered pages"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let image_stream = match page.format {
            RenderFormat::Jpeg => {
                jpeg_xobject(page.bytes.clone(), page.width, page.height, page.grayscale)
            }
            RenderFormat::Png => {
                let decoded =
                    image::load_from_memory_with_format(&page.bytes, ImageFormat::Png)?;
                let (main, mask) = image_xobject(&decoded)?;
                match mask {
                    Some(mask) => {
                        let mask_id = doc.add_object(Object::Stream(mask));
                        let mut main = main;
                        main.dict.set("SMask", Object::Reference(mask_id));
                        main
                    }
                    None => main,
                }
            }
        };
        let image_id = doc.add_object(Object::Stream(image_stream));

        let width = f64::from(page.width);
        let height = f64::from(page.height);
        let content = format!("q\n{width:.2} 0 0 {height:.2} 0 0 cm\n/Im0 Do\nQ");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Im0",
                Object::Reference(image_id),
            )])),
        )]);
        let page_dict = Dictionary::from_iter(vec![
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
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let count = kids.len();
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| OperationError::Codec(e.to_string()))?;
    Ok(buffer)
}

/// Permanently black out regions of a document by rasterizing it.
///
/// The boxes are filled in pixel space before encoding, so the output holds
/// no trace of the covered content and no searchable text.
pub fn redact(
    data: &[u8],
    redactions: &BTreeMap<usize, Vec<Rect>>,
    dpi: f32,
    rasterizer: &mut dyn PageRasterizer,
) -> OperationResult<Vec<u8>> {
    if redactions.values().all(Vec::is_empty) {
        return Err(OperationError::EmptySelection("no redaction regions"));
    }

    let options = RenderOptions {
        dpi,
        format: RenderFormat::Png,
        redactions: redactions.clone(),
        ..RenderOptions::default()
    };
    let pages = render_pages(data, &options, rasterizer)?;
    rebuild_from_images(&pages)
}

/// JPEG quality for [`compress`], linearly interpolated from the dpi.
fn quality_for_dpi(dpi: f32) -> f32 {
    let t = ((dpi - COMPRESS_DPI_LOW) / (COMPRESS_DPI_HIGH - COMPRESS_DPI_LOW)).clamp(0.0, 1.0);
    COMPRESS_QUALITY_FLOOR + t * (COMPRESS_QUALITY_CEILING - COMPRESS_QUALITY_FLOOR)
}

/// Shrink a document by generating candidates and keeping the smallest.
///
/// Candidate one is a structural re-save (orphan pruning plus stream
/// compression), which tends to win on text-heavy documents. Candidate two
/// rasterizes every page to JPEG at a dpi-derived quality, which tends to win
/// on image-heavy ones. When the rasterizer fails, the structural candidate
/// is returned on its own.
pub fn compress(
    data: &[u8],
    dpi: f32,
    rasterizer: &mut dyn PageRasterizer,
) -> OperationResult<Vec<u8>> {
    let structural = PdfFile::load(data)?.save()?;

    let options = RenderOptions {
        dpi,
        format: RenderFormat::Jpeg,
        jpeg_quality: quality_for_dpi(dpi),
        ..RenderOptions::default()
    };
    let rasterized = render_pages(data, &options, rasterizer)
        .and_then(|pages| rebuild_from_images(&pages));

    match rasterized {
        Ok(candidate) if candidate.len() < structural.len() => {
            debug!(
                structural = structural.len(),
                rasterized = candidate.len(),
                "compression picked the rasterized candidate"
            );
            Ok(candidate)
        }
        Ok(candidate) => {
            debug!(
                structural = structural.len(),
                rasterized = candidate.len(),
                "compression picked the structural candidate"
            );
            Ok(structural)
        }
        Err(error) => {
            warn!(%error, "rasterized candidate unavailable, keeping structural re-save");
            Ok(structural)
        }
    }
}

/// Convert a document to grayscale by rasterizing it.
pub fn grayscale(
    data: &[u8],
    dpi: f32,
    quality: f32,
    rasterizer: &mut dyn PageRasterizer,
) -> OperationResult<Vec<u8>> {
    let options = RenderOptions {
        dpi,
        format: RenderFormat::Jpeg,
        jpeg_quality: quality.clamp(GRAYSCALE_QUALITY_SPAN.0, GRAYSCALE_QUALITY_SPAN.1),
        grayscale: true,
        ..RenderOptions::default()
    };
    let pages = render_pages(data, &options, rasterizer)?;
    rebuild_from_images(&pages)
}

#[cfg(test)]
#[path = "raster_tests.rs"]
mod raster_tests;
