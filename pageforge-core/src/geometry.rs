//! Geometry for the two coordinate spaces the engine reconciles.
//!
//! Preview rectangles arrive in *view space*: origin at the top-left corner of
//! a page rendered at some zoom `scale`, Y growing downward. PDF user space has
//! its origin at the bottom-left corner, Y growing upward, measured in points.
//! `view_to_pdf_rect` and `pdf_to_view_rect` are exact inverses of each other.

use crate::operations::{OperationError, OperationResult};

/// An axis-aligned rectangle. The coordinate space depends on context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// How a source rectangle is mapped onto a target rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Uniform scale, preserving aspect ratio, centered in the target
    Fit,
    /// Non-uniform scale filling the target exactly
    Stretch,
}

/// Requested page orientation for resize-type operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Keep the orientation of the source page
    Preserve,
    /// Force portrait output
    Portrait,
    /// Force landscape output
    Landscape,
}

/// Standard page size presets, portrait dimensions in points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePreset {
    A4,
    Letter,
    Legal,
}

impl PagePreset {
    /// Portrait (width, height) in PDF points
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PagePreset::A4 => (595.28, 841.89),
            PagePreset::Letter => (612.0, 792.0),
            PagePreset::Legal => (612.0, 1008.0),
        }
    }
}

/// Convert a view-space rectangle into PDF user space.
///
/// `page_width` and `page_height` are the rendered preview dimensions at
/// `scale`; the unscaled page height is `page_height / scale`. A non-positive
/// scale cannot be inverted and is rejected.
pub fn view_to_pdf_rect(
    rect: Rect,
    _page_width: f64,
    page_height: f64,
    scale: f64,
) -> OperationResult<Rect> {
    if scale <= 0.0 {
        return Err(OperationError::InvalidScale(scale));
    }

    let pdf_height = page_height / scale;
    Ok(Rect {
        x: rect.x / scale,
        y: pdf_height - rect.y / scale - rect.height / scale,
        width: rect.width / scale,
        height: rect.height / scale,
    })
}

/// Exact inverse of [`view_to_pdf_rect`].
pub fn pdf_to_view_rect(
    rect: Rect,
    _page_width: f64,
    page_height: f64,
    scale: f64,
) -> OperationResult<Rect> {
    if scale <= 0.0 {
        return Err(OperationError::InvalidScale(scale));
    }

    let pdf_height = page_height / scale;
    Ok(Rect {
        x: rect.x * scale,
        y: (pdf_height - rect.y - rect.height) * scale,
        width: rect.width * scale,
        height: rect.height * scale,
    })
}

/// Compute the drawn size and offset of a source box placed into a target box.
///
/// Returns `(draw_width, draw_height, offset_x, offset_y)`. Under
/// [`FitMode::Fit`] the aspect ratio is preserved and the result is centered;
/// under [`FitMode::Stretch`] the source fills the target exactly.
pub fn fit_dimensions(
    source_w: f64,
    source_h: f64,
    target_w: f64,
    target_h: f64,
    mode: FitMode,
) -> (f64, f64, f64, f64) {
    match mode {
        FitMode::Stretch => (target_w, target_h, 0.0, 0.0),
        FitMode::Fit => {
            let ratio = (target_w / source_w).min(target_h / source_h);
            let draw_w = source_w * ratio;
            let draw_h = source_h * ratio;
            (
                draw_w,
                draw_h,
                (target_w - draw_w) / 2.0,
                (target_h - draw_h) / 2.0,
            )
        }
    }
}

/// Swap target dimensions when the requested orientation conflicts with the
/// source's natural orientation (`Preserve`) or with the explicit request.
pub fn resolve_orientation(
    source_w: f64,
    source_h: f64,
    target_w: f64,
    target_h: f64,
    orientation: Orientation,
) -> (f64, f64) {
    let target_is_landscape = target_w > target_h;
    let wants_landscape = match orientation {
        Orientation::Preserve => source_w > source_h,
        Orientation::Portrait => false,
        Orientation::Landscape => true,
    };

    if wants_landscape != target_is_landscape {
        (target_h, target_w)
    } else {
        (target_w, target_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_view_to_pdf_flips_y() {
        // 100x50 view rect at (0, 0) on an 800pt-tall page rendered at 1:1
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let pdf = view_to_pdf_rect(rect, 600.0, 800.0, 1.0).unwrap();
        assert_eq!(pdf.x, 0.0);
        assert_eq!(pdf.y, 750.0);
        assert_eq!(pdf.width, 100.0);
        assert_eq!(pdf.height, 50.0);
    }

    #[test]
    fn test_view_to_pdf_divides_by_scale() {
        let rect = Rect::new(100.0, 100.0, 200.0, 100.0);
        let pdf = view_to_pdf_rect(rect, 1200.0, 1600.0, 2.0).unwrap();
        assert_eq!(pdf.x, 50.0);
        assert_eq!(pdf.width, 100.0);
        assert_eq!(pdf.height, 50.0);
        // pdf height = 800, y = 800 - 50 - 50
        assert_eq!(pdf.y, 700.0);
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(view_to_pdf_rect(rect, 600.0, 800.0, 0.0).is_err());
        assert!(pdf_to_view_rect(rect, 600.0, 800.0, -1.5).is_err());
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        // 200x100 source into a 100x100 target: limited by width
        let (w, h, ox, oy) = fit_dimensions(200.0, 100.0, 100.0, 100.0, FitMode::Fit);
        assert_eq!(w, 100.0);
        assert_eq!(h, 50.0);
        assert_eq!(ox, 0.0);
        assert_eq!(oy, 25.0);
    }

    #[test]
    fn test_stretch_fills_target() {
        let (w, h, ox, oy) = fit_dimensions(200.0, 100.0, 100.0, 300.0, FitMode::Stretch);
        assert_eq!((w, h), (100.0, 300.0));
        assert_eq!((ox, oy), (0.0, 0.0));
    }

    #[test]
    fn test_resolve_orientation_preserve() {
        // Landscape source forces the A4 target to landscape
        let (w, h) = resolve_orientation(800.0, 600.0, 595.28, 841.89, Orientation::Preserve);
        assert_eq!((w, h), (841.89, 595.28));

        // Portrait source leaves it alone
        let (w, h) = resolve_orientation(600.0, 800.0, 595.28, 841.89, Orientation::Preserve);
        assert_eq!((w, h), (595.28, 841.89));
    }

    #[test]
    fn test_resolve_orientation_explicit() {
        let (w, h) = resolve_orientation(600.0, 800.0, 595.28, 841.89, Orientation::Landscape);
        assert_eq!((w, h), (841.89, 595.28));

        let (w, h) = resolve_orientation(800.0, 600.0, 841.89, 595.28, Orientation::Portrait);
        assert_eq!((w, h), (595.28, 841.89));
    }

    #[test]
    fn test_preset_dimensions() {
        assert_eq!(PagePreset::Letter.dimensions(), (612.0, 792.0));
        assert_eq!(PagePreset::Legal.dimensions(), (612.0, 1008.0));
    }

    proptest! {
        /// view -> pdf -> view is the identity within floating-point epsilon
        #[test]
        fn roundtrip_view_pdf_view(
            x in 0.0f64..2000.0,
            y in 0.0f64..2000.0,
            w in 0.1f64..1000.0,
            h in 0.1f64..1000.0,
            page_h in 100.0f64..4000.0,
            scale in 0.05f64..8.0,
        ) {
            let rect = Rect::new(x, y, w, h);
            let pdf = view_to_pdf_rect(rect, 1000.0, page_h, scale).unwrap();
            let back = pdf_to_view_rect(pdf, 1000.0, page_h, scale).unwrap();
            prop_assert!((back.x - rect.x).abs() < 1e-6);
            prop_assert!((back.y - rect.y).abs() < 1e-6);
            prop_assert!((back.width - rect.width).abs() < 1e-6);
            prop_assert!((back.height - rect.height).abs() < 1e-6);
        }

        /// Fit never overflows the target and always centers
        #[test]
        fn fit_stays_within_target(
            sw in 1.0f64..2000.0,
            sh in 1.0f64..2000.0,
            tw in 1.0f64..2000.0,
            th in 1.0f64..2000.0,
        ) {
            let (w, h, ox, oy) = fit_dimensions(sw, sh, tw, th, FitMode::Fit);
            prop_assert!(w <= tw + 1e-9);
            prop_assert!(h <= th + 1e-9);
            prop_assert!((ox * 2.0 + w - tw).abs() < 1e-6);
            prop_assert!((oy * 2.0 + h - th).abs() < 1e-6);
            // aspect ratio preserved
            prop_assert!((w / h - sw / sh).abs() < 1e-6 * (sw / sh));
        }
    }
}
