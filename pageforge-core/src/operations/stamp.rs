//! Raster image stamping, used for signature placement.

use tracing::debug;

use super::{OperationError, OperationResult};
use crate::document::PdfFile;
use crate::embed::image_xobject;
use crate::geometry::Rect;

/// Draw a raster image at an exact PDF-space rectangle on one page.
///
/// The page index is re-validated even though callers are expected to have
/// checked it; a missing page is a hard error, not a no-op. PNG and JPEG
/// payloads are accepted; anything the decoder rejects surfaces as
/// [`OperationError::UnsupportedEmbedFormat`].
pub fn stamp_image(
    bytes: &[u8],
    image_bytes: &[u8],
    page_index: usize,
    rect: Rect,
) -> OperationResult<Vec<u8>> {
    let mut file = PdfFile::load(bytes)?;
    if page_index >= file.page_count() {
        return Err(OperationError::PageIndexOutOfRange {
            index: page_index,
            page_count: file.page_count(),
        });
    }

    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| OperationError::UnsupportedEmbedFormat(e.to_string()))?;

    debug!(
        page = page_index,
        width = rect.width,
        height = rect.height,
        "stamping image"
    );

    let (main, mask) = image_xobject(&decoded)?;
    let image_id = file.add_image(main, mask);
    let name = file.register_xobject(page_index, image_id)?;

    let content = format!(
        "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/{name} Do\nQ",
        rect.width, rect.height, rect.x, rect.y,
    );
    file.append_content(page_index, content)?;
    file.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_pdf;

    fn png_fixture() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(20, 10, image::Rgba([0, 0, 0, 200]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_stamp_on_valid_page() {
        let pdf = sample_pdf(2);
        let rect = Rect::new(100.0, 150.0, 120.0, 60.0);
        let out = stamp_image(&pdf, &png_fixture(), 1, rect).unwrap();
        assert_eq!(PdfFile::load(&out).unwrap().page_count(), 2);
    }

    #[test]
    fn test_stamp_out_of_range_page_fails() {
        let pdf = sample_pdf(2);
        let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert!(matches!(
            stamp_image(&pdf, &png_fixture(), 2, rect),
            Err(OperationError::PageIndexOutOfRange {
                index: 2,
                page_count: 2
            })
        ));
    }

    #[test]
    fn test_stamp_rejects_non_image_payload() {
        let pdf = sample_pdf(1);
        let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert!(matches!(
            stamp_image(&pdf, b"definitely not an image", 0, rect),
            Err(OperationError::UnsupportedEmbedFormat(_))
        ));
    }
}
