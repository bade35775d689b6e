//! Document splitting by page ranges or fixed-size chunks.

use tracing::debug;

use super::{normalize_ranges, resolve_page_indexes, OperationResult, PageRange};
use crate::document::{extract, PdfFile};

/// Chunk sizes are clamped into this span.
const CHUNK_SPAN: (usize, usize) = (1, 200);

/// How split output is grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// All selected pages into one output document
    SingleFile,
    /// One output document per surviving range
    FilePerRange,
}

/// Split a document by page ranges.
///
/// `SingleFile` flattens the resolved indices (ascending, deduplicated) into
/// one output. `FilePerRange` emits one document per range that survives
/// normalization; ranges entirely outside the document are skipped rather
/// than emitted as empty files.
pub fn split(bytes: &[u8], ranges: &[PageRange], mode: SplitMode) -> OperationResult<Vec<Vec<u8>>> {
    let source = PdfFile::load(bytes)?;
    let page_count = source.page_count();

    match mode {
        SplitMode::SingleFile => {
            let indices = resolve_page_indexes(Some(ranges), page_count)?;
            debug!(pages = indices.len(), "splitting into a single file");
            Ok(vec![extract(&source, &indices)?.save()?])
        }
        SplitMode::FilePerRange => {
            let surviving = normalize_ranges(ranges, page_count)?;
            debug!(files = surviving.len(), "splitting into one file per range");
            surviving
                .iter()
                .map(|range| {
                    let indices: Vec<usize> = range.indices().collect();
                    extract(&source, &indices)?.save()
                })
                .collect()
        }
    }
}

/// Partition a document into consecutive windows of `pages_per_chunk` pages.
///
/// The final window may be smaller. The chunk size is clamped into `[1, 200]`.
pub fn chunk_split(bytes: &[u8], pages_per_chunk: usize) -> OperationResult<Vec<Vec<u8>>> {
    let source = PdfFile::load(bytes)?;
    let chunk = pages_per_chunk.clamp(CHUNK_SPAN.0, CHUNK_SPAN.1);
    let indices: Vec<usize> = (0..source.page_count()).collect();

    debug!(
        pages = indices.len(),
        chunk, "splitting into fixed-size chunks"
    );
    indices
        .chunks(chunk)
        .map(|window| extract(&source, window)?.save())
        .collect()
}

#[cfg(test)]
#[path = "split_tests.rs"]
mod split_tests;
