//! Blank page insertion.

use tracing::debug;

use super::OperationResult;
use crate::document::{assemble, PagePick, PdfFile};
use crate::geometry::PagePreset;

/// Where blank pages are inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Before the first page
    Start,
    /// After the last page
    End,
    /// Before every original page
    BeforeEach,
    /// After every original page
    AfterEach,
    /// After every `interval`-th original page, except after the final page
    EveryN,
}

/// Size of the inserted blanks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankSize {
    /// Match the dimensions of the neighbouring source page
    MatchSource,
    /// A fixed preset size, portrait
    Preset(PagePreset),
}

/// Options for [`insert_blank_pages`]
#[derive(Debug, Clone)]
pub struct InsertBlankOptions {
    pub position: InsertPosition,
    /// Blanks inserted per insertion point, at least 1
    pub count: usize,
    /// Source-page stride for [`InsertPosition::EveryN`], at least 1
    pub interval: usize,
    pub size: BlankSize,
}

impl Default for InsertBlankOptions {
    fn default() -> Self {
        Self {
            position: InsertPosition::End,
            count: 1,
            interval: 1,
            size: BlankSize::MatchSource,
        }
    }
}

/// Weave blank pages into a document according to the options.
pub fn insert_blank_pages(bytes: &[u8], options: &InsertBlankOptions) -> OperationResult<Vec<u8>> {
    let source = PdfFile::load(bytes)?;
    let page_count = source.page_count();
    let count = options.count.max(1);
    let interval = options.interval.max(1);

    let blank_for = |index: usize| -> OperationResult<PagePick> {
        let (width, height) = match options.size {
            BlankSize::MatchSource => source.page_size(index)?,
            BlankSize::Preset(preset) => preset.dimensions(),
        };
        Ok(PagePick::Blank { width, height })
    };

    let mut picks: Vec<PagePick> = Vec::new();
    match options.position {
        InsertPosition::Start => {
            for _ in 0..count {
                picks.push(blank_for(0)?);
            }
            picks.extend((0..page_count).map(|page| PagePick::Source { source: 0, page }));
        }
        InsertPosition::End => {
            picks.extend((0..page_count).map(|page| PagePick::Source { source: 0, page }));
            let last = page_count.saturating_sub(1);
            for _ in 0..count {
                picks.push(blank_for(last)?);
            }
        }
        InsertPosition::BeforeEach => {
            for page in 0..page_count {
                for _ in 0..count {
                    picks.push(blank_for(page)?);
                }
                picks.push(PagePick::Source { source: 0, page });
            }
        }
        InsertPosition::AfterEach => {
            for page in 0..page_count {
                picks.push(PagePick::Source { source: 0, page });
                for _ in 0..count {
                    picks.push(blank_for(page)?);
                }
            }
        }
        InsertPosition::EveryN => {
            for page in 0..page_count {
                picks.push(PagePick::Source { source: 0, page });
                let is_boundary = (page + 1) % interval == 0;
                let is_last = page + 1 == page_count;
                if is_boundary && !is_last {
                    for _ in 0..count {
                        picks.push(blank_for(page)?);
                    }
                }
            }
        }
    }

    debug!(
        source_pages = page_count,
        total = picks.len(),
        "inserting blank pages"
    );
    assemble(&[&source], &picks)?.save()
}
