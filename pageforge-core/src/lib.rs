//! # pageforge
//!
//! A PDF document-manipulation engine built on top of an external object
//! codec. It covers the page-level transforms and overlay operations behind a
//! typical PDF tools product, working entirely on in-memory byte buffers.
//!
//! ## Features
//!
//! - **Page-tree operations**: merge, split (by range or fixed chunks),
//!   reorder, duplicate, interleave, delete, reverse, rotate
//! - **Overlay compositing**: text watermarks, page numbers, header/footer
//!   lines, raster image stamping for signatures, PDF-onto-PDF overlay
//! - **Canvas transforms**: margins, crop, resize to presets, blank-page
//!   insertion
//! - **Raster pipeline**: irreversible redaction, candidate-based
//!   compression and grayscale conversion, with an off-thread render worker
//!   and synchronous fallback
//! - **Range expressions**: human page-range syntax (`"1-3, 5, 8-10"`) with
//!   validation, normalization and explicit-order parsing
//!
//! Decoding, encoding and page rasterization are collaborator capabilities:
//! the object codec is `lopdf`, and rendering is injected behind the
//! [`raster::PageRasterizer`] trait.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pageforge::operations::{merge, split, MergeInput, SplitMode, parse_ranges};
//!
//! # fn main() -> Result<(), pageforge::operations::OperationError> {
//! let first = std::fs::read("a.pdf")?;
//! let second = std::fs::read("b.pdf")?;
//!
//! // Concatenate two documents
//! let merged = merge(&[MergeInput::new(first), MergeInput::new(second)])?;
//!
//! // Split the result by a user-typed range expression
//! let ranges = parse_ranges("1-3, 6")?;
//! let parts = split(&merged, &ranges, SplitMode::FilePerRange)?;
//! # let _ = parts;
//! # Ok(())
//! # }
//! ```

pub mod document;
mod embed;
mod fonts;
pub mod geometry;
pub mod operations;
pub mod raster;

#[cfg(test)]
pub(crate) mod test_support;

pub use document::PdfFile;
pub use geometry::{
    fit_dimensions, pdf_to_view_rect, resolve_orientation, view_to_pdf_rect, FitMode,
    Orientation, PagePreset, Rect,
};
pub use operations::{
    parse_page_order, parse_ranges, resolve_page_indexes, OperationError, OperationResult,
    PageRange,
};
pub use raster::{
    compress, grayscale, redact, rebuild_from_images, render_pages, PageRasterizer,
    RenderClient, RenderFormat, RenderOptions, RenderedPage,
};

/// Parse a document and report its page count.
///
/// Used by callers for validation and display before picking an operation.
pub fn page_count(bytes: &[u8]) -> OperationResult<usize> {
    Ok(PdfFile::load(bytes)?.page_count())
}
