//! PDF page operations
//!
//! This module provides the high-level operations of the engine: page-tree
//! transforms (merge, split, reorder, duplicate, interleave, delete, reverse,
//! rotate), overlay compositing (watermark, page numbers, header/footer,
//! image stamping, PDF-onto-PDF overlay) and canvas transforms (margins,
//! crop, resize, blank-page insertion).
//!
//! All operations take byte buffers in and produce byte buffers out; they
//! never touch the filesystem. Validation happens before any mutation, so a
//! failed call never yields a partial document.

pub mod annotate;
pub mod blank;
pub mod margins;
pub mod merge;
pub mod organize;
pub mod overlay;
pub mod resize;
pub mod rotate;
pub mod split;
pub mod stamp;
pub mod watermark;

pub use annotate::{header_footer, page_numbers, AnchorPosition, HeaderFooterOptions, PageNumberOptions};
pub use blank::{insert_blank_pages, BlankSize, InsertBlankOptions, InsertPosition};
pub use margins::{add_margins, crop_pages, MarginSpec};
pub use merge::{interleave, merge, MergeInput};
pub use organize::{delete_pages, duplicate, reorder, reverse, DeleteSelection};
pub use overlay::{overlay_document, OverlayMode, OverlayOptions};
pub use resize::{resize_pages, ResizeOptions};
pub use rotate::{rotate, RotationAngle};
pub use split::{chunk_split, split, SplitMode};
pub use stamp::stamp_image;
pub use watermark::{watermark_text, WatermarkOptions};

/// Result type for operations
pub type OperationResult<T> = Result<T, OperationError>;

/// Operation-specific errors
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Malformed page range expression; carries the offending segment
    #[error("Invalid page range \"{0}\"")]
    InvalidRangeSyntax(String),

    /// Every requested range fell outside the document
    #[error("The selected ranges are outside the available pages")]
    RangesOutOfBounds,

    /// Operation needs at least one page, file or region and received none
    #[error("Nothing selected: {0}")]
    EmptySelection(&'static str),

    /// Deleting the selection would leave an empty document
    #[error("Cannot delete all pages of a document")]
    CannotDeleteAllPages,

    /// Page index out of bounds
    #[error("Page index {index} out of bounds (document has {page_count} pages)")]
    PageIndexOutOfRange { index: usize, page_count: usize },

    /// Overlay text was empty or whitespace-only
    #[error("Text content must not be empty")]
    EmptyText,

    /// Embedded image or foreign page could not be decoded
    #[error("Unsupported embed format: {0}")]
    UnsupportedEmbedFormat(String),

    /// Invalid rotation angle
    #[error("Invalid rotation angle: {0} (must be 90, 180, or 270)")]
    InvalidRotation(i32),

    /// Invalid preview zoom scale
    #[error("Invalid zoom scale: {0} (must be > 0)")]
    InvalidScale(f64),

    /// Render worker did not answer within the deadline
    #[error("Render worker timed out")]
    RenderTimeout,

    /// Render worker thread died
    #[error("Render worker crashed: {0}")]
    RenderWorkerCrash(String),

    /// Error from the underlying PDF object codec
    #[error("PDF codec error: {0}")]
    Codec(String),

    /// Error from raster image decoding or encoding
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An inclusive range of zero-based page indices.
///
/// Never constructed with `end < start`; a bare page `n` is the range
/// `{n, n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: usize,
    end: usize,
}

impl PageRange {
    /// Create a range, rejecting `end < start`
    pub fn new(start: usize, end: usize) -> OperationResult<Self> {
        if end < start {
            return Err(OperationError::InvalidRangeSyntax(format!(
                "{}-{}",
                start + 1,
                end + 1
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering exactly one page
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of pages covered
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The page indices covered, ascending
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

/// Parse a human page-range expression like `"1-3, 5, 8-10"`.
///
/// Segments are comma-separated; each is either a single one-based page
/// number or `start-end` with `start <= end`. The returned ranges are
/// zero-based and inclusive, in the order written.
pub fn parse_ranges(input: &str) -> OperationResult<Vec<PageRange>> {
    let segments: Vec<&str> = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(OperationError::InvalidRangeSyntax(input.trim().to_string()));
    }

    segments
        .into_iter()
        .map(|segment| {
            let (start, end) = parse_segment(segment)?;
            if end < start {
                return Err(OperationError::InvalidRangeSyntax(segment.to_string()));
            }
            Ok(PageRange {
                start: start - 1,
                end: end - 1,
            })
        })
        .collect()
}

/// Parse one `n` or `a-b` segment into one-based endpoints.
fn parse_segment(segment: &str) -> OperationResult<(usize, usize)> {
    let parts: Vec<&str> = segment.split('-').map(str::trim).collect();
    if parts.len() > 2 {
        return Err(OperationError::InvalidRangeSyntax(segment.to_string()));
    }

    let start: usize = parts[0]
        .parse()
        .map_err(|_| OperationError::InvalidRangeSyntax(segment.to_string()))?;
    let end: usize = match parts.get(1) {
        Some(token) if !token.is_empty() => token
            .parse()
            .map_err(|_| OperationError::InvalidRangeSyntax(segment.to_string()))?,
        _ => start,
    };

    if start == 0 || end == 0 {
        return Err(OperationError::InvalidRangeSyntax(segment.to_string()));
    }

    Ok((start, end))
}

/// Clamp ranges into `[0, page_count)`, dropping ranges entirely outside.
///
/// Fails with [`OperationError::RangesOutOfBounds`] only when no range
/// survives.
pub fn normalize_ranges(
    ranges: &[PageRange],
    page_count: usize,
) -> OperationResult<Vec<PageRange>> {
    if ranges.is_empty() {
        return Err(OperationError::EmptySelection("at least one range is required"));
    }

    let last = page_count.saturating_sub(1);
    let output: Vec<PageRange> = ranges
        .iter()
        .filter(|range| range.start < page_count)
        .map(|range| PageRange {
            start: range.start,
            end: range.end.min(last),
        })
        .collect();

    if output.is_empty() {
        return Err(OperationError::RangesOutOfBounds);
    }
    Ok(output)
}

/// Resolve ranges against a page count into concrete page indices.
///
/// With `None` every page is selected, in order. Otherwise the ranges are
/// normalized, flattened, deduplicated and returned **sorted ascending**;
/// callers that need the written order must use [`parse_page_order`].
pub fn resolve_page_indexes(
    ranges: Option<&[PageRange]>,
    page_count: usize,
) -> OperationResult<Vec<usize>> {
    let Some(ranges) = ranges else {
        return Ok((0..page_count).collect());
    };

    use std::collections::BTreeSet;

    let mut indexes = BTreeSet::new();
    for range in normalize_ranges(ranges, page_count)? {
        indexes.extend(range.indices());
    }
    Ok(indexes.into_iter().collect())
}

/// Parse an explicit page order like `"3, 1-2, 10-7"`.
///
/// Unlike [`parse_ranges`] the caller-specified sequence is preserved,
/// repeats are kept, and descending segments (`"10-1"`) walk backwards. Every
/// page number must exist in the document.
pub fn parse_page_order(input: &str, page_count: usize) -> OperationResult<Vec<usize>> {
    let segments: Vec<&str> = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(OperationError::InvalidRangeSyntax(input.trim().to_string()));
    }

    let mut order = Vec::new();
    for segment in segments {
        let (start, end) = parse_segment(segment)?;
        for page in [start, end] {
            if page > page_count {
                return Err(OperationError::PageIndexOutOfRange {
                    index: page - 1,
                    page_count,
                });
            }
        }

        if start <= end {
            order.extend((start - 1)..=(end - 1));
        } else {
            order.extend(((end - 1)..=(start - 1)).rev());
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranges_basic() {
        let ranges = parse_ranges("1-3,5,8-10").unwrap();
        assert_eq!(
            ranges,
            vec![
                PageRange { start: 0, end: 2 },
                PageRange { start: 4, end: 4 },
                PageRange { start: 7, end: 9 },
            ]
        );
    }

    #[test]
    fn test_parse_ranges_trims_whitespace() {
        let ranges = parse_ranges(" 2 - 4 ,  7 ").unwrap();
        assert_eq!(
            ranges,
            vec![PageRange { start: 1, end: 3 }, PageRange { start: 6, end: 6 }]
        );
    }

    #[test]
    fn test_parse_ranges_rejects_descending() {
        let err = parse_ranges("5-2").unwrap_err();
        match err {
            OperationError::InvalidRangeSyntax(segment) => assert_eq!(segment, "5-2"),
            other => panic!("expected InvalidRangeSyntax, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_ranges_rejects_garbage() {
        assert!(parse_ranges("").is_err());
        assert!(parse_ranges("  ,  ").is_err());
        assert!(parse_ranges("abc").is_err());
        assert!(parse_ranges("1-2-3").is_err());
        assert!(parse_ranges("0").is_err());
        assert!(parse_ranges("0-3").is_err());
    }

    #[test]
    fn test_parse_ranges_open_end_is_single() {
        // "3-" parses like the bare page 3
        let ranges = parse_ranges("3-").unwrap();
        assert_eq!(ranges, vec![PageRange { start: 2, end: 2 }]);
    }

    #[test]
    fn test_normalize_clamps_and_drops() {
        let ranges = vec![
            PageRange { start: 0, end: 2 },
            PageRange { start: 8, end: 12 },
            PageRange { start: 20, end: 25 },
        ];
        let normalized = normalize_ranges(&ranges, 10).unwrap();
        assert_eq!(
            normalized,
            vec![PageRange { start: 0, end: 2 }, PageRange { start: 8, end: 9 }]
        );
    }

    #[test]
    fn test_normalize_all_out_of_bounds() {
        let ranges = vec![PageRange { start: 20, end: 25 }];
        assert!(matches!(
            normalize_ranges(&ranges, 10),
            Err(OperationError::RangesOutOfBounds)
        ));
    }

    #[test]
    fn test_resolve_none_selects_all() {
        assert_eq!(resolve_page_indexes(None, 4).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_resolve_dedupes_and_sorts() {
        let ranges = vec![
            PageRange { start: 5, end: 7 },
            PageRange { start: 0, end: 1 },
            PageRange { start: 6, end: 8 },
        ];
        assert_eq!(
            resolve_page_indexes(Some(&ranges), 10).unwrap(),
            vec![0, 1, 5, 6, 7, 8]
        );
    }

    #[test]
    fn test_parse_page_order_descending() {
        assert_eq!(
            parse_page_order("10-1", 10).unwrap(),
            vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]
        );
    }

    #[test]
    fn test_parse_page_order_keeps_repeats() {
        assert_eq!(parse_page_order("2,2,1-3", 5).unwrap(), vec![1, 1, 0, 1, 2]);
    }

    #[test]
    fn test_parse_page_order_rejects_missing_page() {
        assert!(matches!(
            parse_page_order("1,11", 10),
            Err(OperationError::PageIndexOutOfRange { index: 10, page_count: 10 })
        ));
    }

    #[test]
    fn test_page_range_constructor_rejects_inverted() {
        assert!(PageRange::new(5, 2).is_err());
        assert_eq!(PageRange::new(2, 5).unwrap().len(), 4);
    }
}
