//! Diagonal text watermarks.

use tracing::debug;

use super::{resolve_page_indexes, OperationError, OperationResult, PageRange};
use crate::document::{escape_pdf_text, PdfFile};
use crate::fonts::helvetica_width;

const OPACITY_SPAN: (f64, f64) = (0.05, 1.0);
const ANGLE_SPAN: (f64, f64) = (-89.0, 89.0);
const FONT_SIZE_SPAN: (f64, f64) = (10.0, 180.0);

/// Fill gray level for watermark text
const WATERMARK_GRAY: f64 = 0.6;

/// Options for [`watermark_text`]
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub text: String,
    /// Fill opacity, clamped into `[0.05, 1.0]`
    pub opacity: f64,
    /// Rotation in degrees, clamped into `[-89, 89]`
    pub angle_degrees: f64,
    /// Font size in points, clamped into `[10, 180]`
    pub font_size: f64,
    /// Pages to watermark; `None` selects every page
    pub ranges: Option<Vec<PageRange>>,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            opacity: 0.25,
            angle_degrees: -35.0,
            font_size: 64.0,
            ranges: None,
        }
    }
}

/// Draw `text` centered and rotated across each selected page.
pub fn watermark_text(bytes: &[u8], options: &WatermarkOptions) -> OperationResult<Vec<u8>> {
    if options.text.trim().is_empty() {
        return Err(OperationError::EmptyText);
    }

    let mut file = PdfFile::load(bytes)?;
    let indices = resolve_page_indexes(options.ranges.as_deref(), file.page_count())?;

    let opacity = options.opacity.clamp(OPACITY_SPAN.0, OPACITY_SPAN.1);
    let angle = options
        .angle_degrees
        .clamp(ANGLE_SPAN.0, ANGLE_SPAN.1)
        .to_radians();
    let font_size = options.font_size.clamp(FONT_SIZE_SPAN.0, FONT_SIZE_SPAN.1);
    let text = escape_pdf_text(options.text.trim());
    let text_width = helvetica_width(options.text.trim(), font_size);

    debug!(pages = indices.len(), "applying text watermark");
    for index in indices {
        let (page_width, page_height) = file.page_size(index)?;
        let font = file.register_helvetica(index)?;
        let gs = file.register_opacity(index, opacity)?;

        let (sin, cos) = angle.sin_cos();
        // Shift the rotated baseline so the text's visual center lands on the
        // page center.
        let half_width = text_width / 2.0;
        let half_cap = font_size * 0.35;
        let tx = page_width / 2.0 - (half_width * cos - half_cap * sin);
        let ty = page_height / 2.0 - (half_width * sin + half_cap * cos);

        let content = format!(
            "q\n/{gs} gs\n{gray} {gray} {gray} rg\nBT\n/{font} {font_size} Tf\n\
             {cos:.5} {sin:.5} {neg_sin:.5} {cos:.5} {tx:.2} {ty:.2} Tm\n({text}) Tj\nET\nQ",
            gray = WATERMARK_GRAY,
            neg_sin = -sin,
        );
        file.append_content(index, content)?;
    }
    file.save()
}
