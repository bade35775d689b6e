//! Page sequence surgery: reorder, duplicate, reverse and delete.

use std::collections::BTreeSet;

use tracing::debug;

use super::{
    parse_page_order, resolve_page_indexes, OperationError, OperationResult, PageRange,
};
use crate::document::{extract, PdfFile};

/// Duplicate repeat counts are clamped into this span.
const REPEAT_SPAN: (usize, usize) = (1, 10);

/// Which pages a delete removes
#[derive(Debug, Clone)]
pub enum DeleteSelection {
    /// Pages covered by explicit ranges
    Ranges(Vec<PageRange>),
    /// Pages with odd visible numbers (1, 3, 5, ...)
    OddPages,
    /// Pages with even visible numbers (2, 4, 6, ...)
    EvenPages,
}

/// Rebuild the document in the order given by `order_spec`.
///
/// The order string uses the explicit-order syntax: repeats produce
/// additional copies, and descending segments like `"10-1"` walk backwards.
pub fn reorder(bytes: &[u8], order_spec: &str) -> OperationResult<Vec<u8>> {
    let source = PdfFile::load(bytes)?;
    let order = parse_page_order(order_spec, source.page_count())?;
    debug!(pages = order.len(), "reordering pages");
    extract(&source, &order)?.save()
}

/// Insert `repeat_count` extra copies after each selected page, leaving the
/// relative order of everything else untouched.
pub fn duplicate(
    bytes: &[u8],
    ranges: &[PageRange],
    repeat_count: usize,
) -> OperationResult<Vec<u8>> {
    let source = PdfFile::load(bytes)?;
    let repeat = repeat_count.clamp(REPEAT_SPAN.0, REPEAT_SPAN.1);
    let selected: BTreeSet<usize> = resolve_page_indexes(Some(ranges), source.page_count())?
        .into_iter()
        .collect();

    let mut order = Vec::new();
    for page in 0..source.page_count() {
        order.push(page);
        if selected.contains(&page) {
            order.extend(std::iter::repeat(page).take(repeat));
        }
    }

    debug!(
        selected = selected.len(),
        repeat, "duplicating selected pages"
    );
    extract(&source, &order)?.save()
}

/// Copy all pages in strictly reversed order.
pub fn reverse(bytes: &[u8]) -> OperationResult<Vec<u8>> {
    let source = PdfFile::load(bytes)?;
    let order: Vec<usize> = (0..source.page_count()).rev().collect();
    extract(&source, &order)?.save()
}

/// Remove the selected pages, keeping everything else in order.
///
/// Fails with [`OperationError::CannotDeleteAllPages`] when nothing would
/// survive.
pub fn delete_pages(bytes: &[u8], selection: &DeleteSelection) -> OperationResult<Vec<u8>> {
    let source = PdfFile::load(bytes)?;
    let page_count = source.page_count();

    let removed: BTreeSet<usize> = match selection {
        DeleteSelection::Ranges(ranges) => {
            if ranges.is_empty() {
                return Err(OperationError::EmptySelection(
                    "delete requires at least one range",
                ));
            }
            resolve_page_indexes(Some(ranges), page_count)?
                .into_iter()
                .collect()
        }
        // Zero-based even indices carry odd visible page numbers
        DeleteSelection::OddPages => (0..page_count).filter(|index| index % 2 == 0).collect(),
        DeleteSelection::EvenPages => (0..page_count).filter(|index| index % 2 == 1).collect(),
    };

    let survivors: Vec<usize> = (0..page_count)
        .filter(|index| !removed.contains(index))
        .collect();

    if survivors.is_empty() {
        return Err(OperationError::CannotDeleteAllPages);
    }

    debug!(
        removed = removed.len(),
        kept = survivors.len(),
        "deleting pages"
    );
    extract(&source, &survivors)?.save()
}

#[cfg(test)]
#[path = "organize_tests.rs"]
mod organize_tests;
