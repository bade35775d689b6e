//! Raster image embedding into the PDF object model.
//!
//! Opaque images are stored as Flate-compressed RGB; images with an alpha
//! channel additionally carry their alpha as a grayscale soft mask. Encoded
//! JPEG data from the raster pipeline passes straight through as DCT streams.

use std::io::Write;

use image::DynamicImage;
use lopdf::{Dictionary, Object, ObjectId, Stream};

use crate::document::PdfFile;
use crate::operations::OperationResult;

fn image_dict(width: u32, height: u32, color_space: &[u8], filter: &[u8]) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(filter.to_vec())),
    ])
}

fn deflate(data: &[u8]) -> OperationResult<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Build an Image XObject (and soft mask, when the source has alpha) from a
/// decoded image.
pub(crate) fn image_xobject(img: &DynamicImage) -> OperationResult<(Stream, Option<Stream>)> {
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let main = Stream::new(
            image_dict(width, height, b"DeviceRGB", b"FlateDecode"),
            deflate(&rgb)?,
        );
        let mask = Stream::new(
            image_dict(width, height, b"DeviceGray", b"FlateDecode"),
            deflate(&alpha)?,
        );
        Ok((main, Some(mask)))
    } else {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let main = Stream::new(
            image_dict(width, height, b"DeviceRGB", b"FlateDecode"),
            deflate(rgb.as_raw())?,
        );
        Ok((main, None))
    }
}

/// Wrap already-encoded JPEG bytes as a DCT image stream.
pub(crate) fn jpeg_xobject(jpeg: Vec<u8>, width: u32, height: u32, grayscale: bool) -> Stream {
    let color_space: &[u8] = if grayscale { b"DeviceGray" } else { b"DeviceRGB" };
    Stream::new(image_dict(width, height, color_space, b"DCTDecode"), jpeg)
}

impl PdfFile {
    /// Add an image stream (plus optional soft mask) to the object table.
    pub(crate) fn add_image(&mut self, mut main: Stream, mask: Option<Stream>) -> ObjectId {
        if let Some(mask) = mask {
            let mask_id = self.doc_mut().add_object(Object::Stream(mask));
            main.dict.set("SMask", Object::Reference(mask_id));
        }
        self.doc_mut().add_object(Object::Stream(main))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_image_has_no_mask() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            4,
            image::Rgb([10, 20, 30]),
        ));
        let (main, mask) = image_xobject(&img).unwrap();
        assert!(mask.is_none());
        assert!(matches!(main.dict.get(b"Width"), Ok(Object::Integer(4))));
    }

    #[test]
    fn test_alpha_image_gets_soft_mask() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            3,
            image::Rgba([0, 0, 0, 128]),
        ));
        let (_, mask) = image_xobject(&img).unwrap();
        let mask = mask.expect("soft mask for alpha image");
        assert!(matches!(mask.dict.get(b"Height"), Ok(Object::Integer(3))));
    }

    #[test]
    fn test_jpeg_passthrough_keeps_bytes() {
        let payload = vec![0xFF, 0xD8, 0xFF, 0xD9];
        let stream = jpeg_xobject(payload.clone(), 8, 8, false);
        assert_eq!(stream.content, payload);
        assert!(matches!(
            stream.dict.get(b"Filter"),
            Ok(Object::Name(name)) if name == b"DCTDecode"
        ));
    }
}
