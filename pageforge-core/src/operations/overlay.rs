//! PDF-onto-PDF overlay: draw pages of one document on top of another.

use tracing::debug;

use super::{OperationError, OperationResult};
use crate::document::PdfFile;
use crate::geometry::{fit_dimensions, FitMode};

const SCALE_PERCENT_SPAN: (f64, f64) = (10.0, 200.0);
const OPACITY_SPAN: (f64, f64) = (0.05, 1.0);

/// How overlay pages are paired with base pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Reuse overlay page 0 on every base page
    RepeatFirst,
    /// Pair base page `i` with overlay page `i`; base pages past the
    /// overlay's page count are left untouched
    MatchPages,
}

/// Options for [`overlay_document`]
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    pub mode: OverlayMode,
    /// Overlay opacity, clamped into `[0.05, 1.0]`
    pub opacity: f64,
    /// Upper bound on overlay size as a percentage of the base page,
    /// clamped into `[10, 200]`
    pub scale_percent: f64,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            mode: OverlayMode::RepeatFirst,
            opacity: 1.0,
            scale_percent: 100.0,
        }
    }
}

/// Embed pages of `overlay_bytes` onto the pages of `base_bytes`.
///
/// The overlay page is scaled uniformly to fit within `scale_percent` of the
/// base page and centered. Under `RepeatFirst` the first overlay page is
/// converted to a form once and reused on every base page.
pub fn overlay_document(
    base_bytes: &[u8],
    overlay_bytes: &[u8],
    options: &OverlayOptions,
) -> OperationResult<Vec<u8>> {
    let mut base = PdfFile::load(base_bytes)?;
    let overlay = PdfFile::load(overlay_bytes)?;

    if overlay.page_count() == 0 {
        return Err(OperationError::EmptySelection("overlay document has no pages"));
    }

    let imported_pages = base.import_objects(&overlay);
    let fraction = options
        .scale_percent
        .clamp(SCALE_PERCENT_SPAN.0, SCALE_PERCENT_SPAN.1)
        / 100.0;
    let opacity = options.opacity.clamp(OPACITY_SPAN.0, OPACITY_SPAN.1);

    debug!(
        base_pages = base.page_count(),
        overlay_pages = overlay.page_count(),
        "overlaying documents"
    );

    let mut first_form = None;
    for base_index in 0..base.page_count() {
        let overlay_index = match options.mode {
            OverlayMode::RepeatFirst => 0,
            OverlayMode::MatchPages => {
                if base_index >= overlay.page_count() {
                    continue;
                }
                base_index
            }
        };

        let form_id = match (options.mode, first_form) {
            (OverlayMode::RepeatFirst, Some(id)) => id,
            _ => {
                let id = base
                    .form_from_page(imported_pages[overlay_index])
                    .map_err(|e| OperationError::UnsupportedEmbedFormat(e.to_string()))?;
                if options.mode == OverlayMode::RepeatFirst {
                    first_form = Some(id);
                }
                id
            }
        };

        let (base_w, base_h) = base.page_size(base_index)?;
        let (src_w, src_h) = overlay.page_size(overlay_index)?;
        let src_box = overlay.media_box(overlay_index)?;

        let (draw_w, draw_h, _, _) = fit_dimensions(
            src_w,
            src_h,
            base_w * fraction,
            base_h * fraction,
            FitMode::Fit,
        );
        let ratio = draw_w / src_w;
        // Center within the full base page, compensating for a non-zero
        // media box origin in the overlay source.
        let e = (base_w - draw_w) / 2.0 - ratio * src_box[0];
        let f = (base_h - draw_h) / 2.0 - ratio * src_box[1];

        let gs = base.register_opacity(base_index, opacity)?;
        let name = base.register_xobject(base_index, form_id)?;
        let content = format!(
            "q\n/{gs} gs\n{ratio:.5} 0 0 {ratio:.5} {e:.2} {f:.2} cm\n/{name} Do\nQ",
        );
        base.append_content(base_index, content)?;
    }

    base.save()
}
