//! Redrawing pages onto preset-sized canvases.

use tracing::debug;

use super::{resolve_page_indexes, OperationResult, PageRange};
use crate::document::PdfFile;
use crate::geometry::{fit_dimensions, resolve_orientation, FitMode, Orientation, PagePreset};

/// Options for [`resize_pages`]
#[derive(Debug, Clone)]
pub struct ResizeOptions {
    pub preset: PagePreset,
    pub orientation: Orientation,
    pub mode: FitMode,
    /// Pages to resize; `None` selects every page
    pub ranges: Option<Vec<PageRange>>,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            preset: PagePreset::A4,
            orientation: Orientation::Preserve,
            mode: FitMode::Fit,
            ranges: None,
        }
    }
}

/// Redraw each selected page onto a new canvas sized per preset and
/// orientation. Unselected pages are copied through unchanged.
pub fn resize_pages(bytes: &[u8], options: &ResizeOptions) -> OperationResult<Vec<u8>> {
    let mut file = PdfFile::load(bytes)?;
    let indices = resolve_page_indexes(options.ranges.as_deref(), file.page_count())?;

    let (preset_w, preset_h) = options.preset.dimensions();
    debug!(pages = indices.len(), "resizing pages");

    for index in indices {
        let (source_w, source_h) = file.page_size(index)?;
        let source_box = file.media_box(index)?;
        let (target_w, target_h) =
            resolve_orientation(source_w, source_h, preset_w, preset_h, options.orientation);
        let (draw_w, draw_h, offset_x, offset_y) =
            fit_dimensions(source_w, source_h, target_w, target_h, options.mode);

        let scale_x = draw_w / source_w;
        let scale_y = draw_h / source_h;
        // Compensate for a non-zero media box origin in the source page
        let e = offset_x - scale_x * source_box[0];
        let f = offset_y - scale_y * source_box[1];

        let page_id = file.page_id(index)?;
        let form_id = file.form_from_page(page_id)?;
        file.replace_page_with_form(
            index,
            form_id,
            target_w,
            target_h,
            [scale_x, 0.0, 0.0, scale_y, e, f],
        )?;
    }
    file.save()
}
