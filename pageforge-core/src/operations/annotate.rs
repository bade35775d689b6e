//! Page numbering and header/footer lines.

use tracing::debug;

use super::{resolve_page_indexes, OperationError, OperationResult, PageRange};
use crate::document::{escape_pdf_text, PdfFile};
use crate::fonts::helvetica_width;

const OPACITY_SPAN: (f64, f64) = (0.05, 1.0);

/// Separator between composed header/footer parts
const PART_SEPARATOR: &str = " | ";

/// Where stamped text is anchored on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl AnchorPosition {
    fn is_top(self) -> bool {
        matches!(
            self,
            AnchorPosition::TopLeft | AnchorPosition::TopCenter | AnchorPosition::TopRight
        )
    }
}

/// Options for [`page_numbers`]
#[derive(Debug, Clone)]
pub struct PageNumberOptions {
    /// First number stamped
    pub start_at: i64,
    pub prefix: String,
    pub suffix: String,
    pub position: AnchorPosition,
    pub font_size: f64,
    pub opacity: f64,
    /// Pages to number; `None` selects every page
    pub ranges: Option<Vec<PageRange>>,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            start_at: 1,
            prefix: String::new(),
            suffix: String::new(),
            position: AnchorPosition::BottomCenter,
            font_size: 11.0,
            opacity: 1.0,
            ranges: None,
        }
    }
}

/// Options for [`header_footer`]
#[derive(Debug, Clone)]
pub struct HeaderFooterOptions {
    pub header_text: String,
    pub footer_text: String,
    /// Append today's date to the header line
    pub include_date: bool,
    /// Append "Page i of N" to the footer line, N being the total document
    /// page count rather than the count of selected pages
    pub include_page_numbers: bool,
    pub font_size: f64,
    pub opacity: f64,
    /// Pages to annotate; `None` selects every page
    pub ranges: Option<Vec<PageRange>>,
}

impl Default for HeaderFooterOptions {
    fn default() -> Self {
        Self {
            header_text: String::new(),
            footer_text: String::new(),
            include_date: false,
            include_page_numbers: true,
            font_size: 10.0,
            opacity: 1.0,
            ranges: None,
        }
    }
}

/// Stamp an increasing counter onto the selected pages.
///
/// The counter increases by one per selected page in resolution order,
/// independent of the pages' own indices.
pub fn page_numbers(bytes: &[u8], options: &PageNumberOptions) -> OperationResult<Vec<u8>> {
    let mut file = PdfFile::load(bytes)?;
    let indices = resolve_page_indexes(options.ranges.as_deref(), file.page_count())?;

    let font_size = options.font_size.max(4.0);
    let opacity = options.opacity.clamp(OPACITY_SPAN.0, OPACITY_SPAN.1);

    debug!(pages = indices.len(), "stamping page numbers");
    for (offset, index) in indices.iter().copied().enumerate() {
        let number = options.start_at + offset as i64;
        let label = format!("{}{}{}", options.prefix, number, options.suffix);
        stamp_line(
            &mut file,
            index,
            &label,
            options.position,
            font_size,
            opacity,
        )?;
    }
    file.save()
}

/// Draw a header line, a footer line, or both on the selected pages.
///
/// Header and footer strings are composed from their present parts joined by
/// a separator; an operation where both lines come out empty is rejected.
pub fn header_footer(bytes: &[u8], options: &HeaderFooterOptions) -> OperationResult<Vec<u8>> {
    let mut file = PdfFile::load(bytes)?;
    let total_pages = file.page_count();
    let indices = resolve_page_indexes(options.ranges.as_deref(), total_pages)?;

    let font_size = options.font_size.max(4.0);
    let opacity = options.opacity.clamp(OPACITY_SPAN.0, OPACITY_SPAN.1);

    let date = options
        .include_date
        .then(|| chrono::Local::now().format("%Y-%m-%d").to_string());

    let header = compose_parts(&[
        non_empty(&options.header_text),
        date.as_deref(),
    ]);

    if header.is_empty() && non_empty(&options.footer_text).is_none() && !options.include_page_numbers
    {
        return Err(OperationError::EmptyText);
    }

    debug!(pages = indices.len(), "stamping header and footer");
    for index in indices {
        if !header.is_empty() {
            stamp_line(
                &mut file,
                index,
                &header,
                AnchorPosition::TopCenter,
                font_size,
                opacity,
            )?;
        }

        let page_label = options
            .include_page_numbers
            .then(|| format!("Page {} of {}", index + 1, total_pages));
        let footer = compose_parts(&[non_empty(&options.footer_text), page_label.as_deref()]);
        if !footer.is_empty() {
            stamp_line(
                &mut file,
                index,
                &footer,
                AnchorPosition::BottomCenter,
                font_size,
                opacity,
            )?;
        }
    }
    file.save()
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn compose_parts(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

/// Draw one line of text at an anchor position with a margin proportional to
/// the font size.
fn stamp_line(
    file: &mut PdfFile,
    index: usize,
    text: &str,
    position: AnchorPosition,
    font_size: f64,
    opacity: f64,
) -> OperationResult<()> {
    let (page_width, page_height) = file.page_size(index)?;
    let font = file.register_helvetica(index)?;
    let gs = file.register_opacity(index, opacity)?;

    let margin = font_size * 1.5;
    let text_width = helvetica_width(text, font_size);

    let x = match position {
        AnchorPosition::TopLeft | AnchorPosition::BottomLeft => margin,
        AnchorPosition::TopCenter | AnchorPosition::BottomCenter => {
            (page_width - text_width) / 2.0
        }
        AnchorPosition::TopRight | AnchorPosition::BottomRight => {
            page_width - margin - text_width
        }
    };
    let y = if position.is_top() {
        page_height - margin
    } else {
        margin
    };

    let content = format!(
        "q\n/{gs} gs\n0 0 0 rg\nBT\n/{font} {font_size} Tf\n{x:.2} {y:.2} Td\n({}) Tj\nET\nQ",
        escape_pdf_text(text),
    );
    file.append_content(index, content)
}
