//! Canvas margins and cropping.

use tracing::debug;

use super::{resolve_page_indexes, OperationResult, PageRange};
use crate::document::PdfFile;

/// Smallest visible page dimension a crop may leave behind, in points.
const MIN_VISIBLE: f64 = 20.0;

/// Per-side distances in points. Negative values are treated as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarginSpec {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl MarginSpec {
    /// Uniform margins on all four sides
    pub fn uniform(amount: f64) -> Self {
        Self {
            top: amount,
            right: amount,
            bottom: amount,
            left: amount,
        }
    }

    fn sanitized(self) -> Self {
        Self {
            top: self.top.max(0.0),
            right: self.right.max(0.0),
            bottom: self.bottom.max(0.0),
            left: self.left.max(0.0),
        }
    }
}

/// Grow each selected page's canvas by the margin amounts.
///
/// Each side is clamped to at most half of the corresponding page dimension.
/// Existing content and annotations are shifted by `(left, bottom)` so the
/// original page appears inset rather than clipped.
pub fn add_margins(
    bytes: &[u8],
    margins: MarginSpec,
    ranges: Option<&[PageRange]>,
) -> OperationResult<Vec<u8>> {
    let mut file = PdfFile::load(bytes)?;
    let indices = resolve_page_indexes(ranges, file.page_count())?;

    debug!(pages = indices.len(), "adding page margins");
    for index in indices {
        let (width, height) = file.page_size(index)?;
        let spec = margins.sanitized();
        let left = spec.left.min(width / 2.0);
        let right = spec.right.min(width / 2.0);
        let top = spec.top.min(height / 2.0);
        let bottom = spec.bottom.min(height / 2.0);

        let mb = file.media_box(index)?;
        file.set_media_box(
            index,
            [mb[0], mb[1], mb[2] + left + right, mb[3] + top + bottom],
        )?;
        file.wrap_content(
            index,
            format!("q\n1 0 0 1 {left:.2} {bottom:.2} cm\n"),
            "\nQ".to_string(),
        )?;
        file.translate_annotations(index, left, bottom)?;
    }
    file.save()
}

/// Shrink the visible region of each selected page by the given insets.
///
/// Insets are scaled back when they would leave less than a 20-point floor
/// in either dimension.
pub fn crop_pages(
    bytes: &[u8],
    insets: MarginSpec,
    ranges: Option<&[PageRange]>,
) -> OperationResult<Vec<u8>> {
    let mut file = PdfFile::load(bytes)?;
    let indices = resolve_page_indexes(ranges, file.page_count())?;

    debug!(pages = indices.len(), "cropping pages");
    for index in indices {
        let (width, height) = file.page_size(index)?;
        let spec = insets.sanitized();

        let (left, right) = bounded_insets(spec.left, spec.right, width);
        let (bottom, top) = bounded_insets(spec.bottom, spec.top, height);

        let mb = file.media_box(index)?;
        let cropped = [mb[0] + left, mb[1] + bottom, mb[2] - right, mb[3] - top];
        file.set_media_box(index, cropped)?;
        file.set_crop_box(index, cropped)?;
    }
    file.save()
}

/// Scale a pair of opposing insets so the remaining extent keeps the minimum
/// visible floor.
fn bounded_insets(near: f64, far: f64, extent: f64) -> (f64, f64) {
    let available = (extent - MIN_VISIBLE).max(0.0);
    let requested = near + far;
    if requested <= available || requested == 0.0 {
        (near, far)
    } else {
        let factor = available / requested;
        (near * factor, far * factor)
    }
}
