//! Document concatenation and interleaving.

use tracing::debug;

use super::{resolve_page_indexes, OperationError, OperationResult, PageRange};
use crate::document::{assemble, PagePick, PdfFile};

/// One input document for a merge, optionally restricted to a page selection.
pub struct MergeInput {
    pub bytes: Vec<u8>,
    pub pages: Option<Vec<PageRange>>,
}

impl MergeInput {
    /// Include every page of the document
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, pages: None }
    }

    /// Include only the pages covered by `ranges`
    pub fn with_pages(bytes: Vec<u8>, ranges: Vec<PageRange>) -> Self {
        Self {
            bytes,
            pages: Some(ranges),
        }
    }
}

/// Concatenate the selected pages of every input, in input order.
///
/// The merge operation requires at least two documents; selections that
/// resolve to no pages fail before anything is copied.
pub fn merge(inputs: &[MergeInput]) -> OperationResult<Vec<u8>> {
    if inputs.len() < 2 {
        return Err(OperationError::EmptySelection(
            "merge requires at least two documents",
        ));
    }

    let sources: Vec<PdfFile> = inputs
        .iter()
        .map(|input| PdfFile::load(&input.bytes))
        .collect::<OperationResult<_>>()?;

    let mut picks = Vec::new();
    for (source_index, (input, source)) in inputs.iter().zip(&sources).enumerate() {
        let indices = resolve_page_indexes(input.pages.as_deref(), source.page_count())?;
        picks.extend(indices.into_iter().map(|page| PagePick::Source {
            source: source_index,
            page,
        }));
    }

    debug!(documents = inputs.len(), pages = picks.len(), "merging documents");
    let source_refs: Vec<&PdfFile> = sources.iter().collect();
    assemble(&source_refs, &picks)?.save()
}

/// Alternate pages from each document: page 0 of every input, then page 1,
/// and so on. Documents that run out of pages are skipped for the remaining
/// rounds.
pub fn interleave(inputs: &[Vec<u8>]) -> OperationResult<Vec<u8>> {
    if inputs.len() < 2 {
        return Err(OperationError::EmptySelection(
            "interleave requires at least two documents",
        ));
    }

    let sources: Vec<PdfFile> = inputs
        .iter()
        .map(|bytes| PdfFile::load(bytes))
        .collect::<OperationResult<_>>()?;

    let rounds = sources
        .iter()
        .map(PdfFile::page_count)
        .max()
        .unwrap_or(0);

    let mut picks = Vec::new();
    for page in 0..rounds {
        for (source_index, source) in sources.iter().enumerate() {
            if page < source.page_count() {
                picks.push(PagePick::Source {
                    source: source_index,
                    page,
                });
            }
        }
    }

    debug!(documents = inputs.len(), pages = picks.len(), "interleaving documents");
    let source_refs: Vec<&PdfFile> = sources.iter().collect();
    assemble(&source_refs, &picks)?.save()
}
