use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pageforge::operations::{
    chunk_split, delete_pages, duplicate, header_footer, interleave, merge, page_numbers,
    reorder, reverse, rotate, split, stamp_image, watermark_text, AnchorPosition,
    DeleteSelection, HeaderFooterOptions, MergeInput, PageNumberOptions, RotationAngle,
    SplitMode, WatermarkOptions,
};
use pageforge::{page_count, parse_ranges, Rect};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "pageforge",
    about = "PDF page manipulation from the command line",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge multiple PDFs into one
    Merge {
        /// Input PDF files, in output order
        files: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a PDF by page ranges
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Page ranges, e.g. "1-3,5,8-10"
        #[arg(short, long)]
        ranges: String,

        /// Output pattern; "{}" is replaced by the part number
        #[arg(short = 'p', long, default_value = "part_{}.pdf")]
        pattern: String,

        /// Emit one file per range instead of a single combined file
        #[arg(long)]
        per_range: bool,
    },

    /// Split a PDF into fixed-size chunks
    Chunk {
        /// Input PDF file
        input: PathBuf,

        /// Pages per output file
        #[arg(short = 'n', long, default_value = "10")]
        pages: usize,

        /// Output pattern; "{}" is replaced by the chunk number
        #[arg(short = 'p', long, default_value = "chunk_{}.pdf")]
        pattern: String,
    },

    /// Rebuild a PDF in an explicit page order
    Reorder {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Page order, e.g. "3,1-2" or "10-1" for descending runs
        #[arg(long)]
        order: String,
    },

    /// Reverse the page order
    Reverse {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Duplicate selected pages in place
    Duplicate {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Pages to duplicate, e.g. "2-4"
        #[arg(short, long)]
        ranges: String,

        /// Copies inserted after each selected page (1-10)
        #[arg(short = 'c', long, default_value = "1")]
        count: usize,
    },

    /// Interleave pages from multiple PDFs
    Interleave {
        /// Input PDF files, in round-robin order
        files: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete pages from a PDF
    Delete {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Pages to delete, e.g. "4,7-9" (omit with --odd or --even)
        #[arg(short, long)]
        ranges: Option<String>,

        /// Delete odd-numbered pages
        #[arg(long, conflicts_with_all = ["ranges", "even"])]
        odd: bool,

        /// Delete even-numbered pages
        #[arg(long, conflicts_with = "ranges")]
        even: bool,
    },

    /// Rotate pages in a PDF
    Rotate {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Rotation angle (90, 180, 270)
        #[arg(short, long, default_value = "90")]
        angle: i32,

        /// Pages to rotate, e.g. "1,3,5"; all pages when omitted
        #[arg(short = 'p', long)]
        pages: Option<String>,
    },

    /// Draw a text watermark across pages
    Watermark {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Watermark text
        #[arg(short, long)]
        text: String,

        /// Opacity between 0.05 and 1.0
        #[arg(long, default_value = "0.25")]
        opacity: f64,

        /// Rotation in degrees, between -89 and 89
        #[arg(long, default_value = "-35")]
        angle: f64,

        /// Font size in points (10-180)
        #[arg(long, default_value = "64")]
        size: f64,
    },

    /// Stamp page numbers onto pages
    PageNumbers {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// First number stamped
        #[arg(long, default_value = "1")]
        start: i64,

        /// Text before the number
        #[arg(long, default_value = "")]
        prefix: String,

        /// Anchor: top-left, top-center, top-right, bottom-left,
        /// bottom-center or bottom-right
        #[arg(long, default_value = "bottom-center")]
        position: String,
    },

    /// Draw header and footer lines
    HeaderFooter {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Header text
        #[arg(long, default_value = "")]
        header: String,

        /// Footer text
        #[arg(long, default_value = "")]
        footer: String,

        /// Append today's date to the header
        #[arg(long)]
        date: bool,

        /// Skip the "Page i of N" footer suffix
        #[arg(long)]
        no_page_numbers: bool,
    },

    /// Stamp an image (e.g. a signature) onto one page
    Stamp {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// PNG or JPEG image to stamp
        #[arg(short, long)]
        image: PathBuf,

        /// Target page (1-based)
        #[arg(long)]
        page: usize,

        /// Placement in PDF points: x,y,width,height
        #[arg(long)]
        rect: String,
    },

    /// Show basic information about a PDF
    Info {
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!("dispatching command");
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Merge { files, output } => {
            if files.len() < 2 {
                bail!("merge needs at least two input files");
            }
            let inputs = files
                .iter()
                .map(|path| Ok(MergeInput::new(read(path)?)))
                .collect::<Result<Vec<_>>>()?;
            write(&output, &merge(&inputs)?)?;
            println!("Merged {} files into {}", files.len(), output.display());
        }

        Commands::Split {
            input,
            ranges,
            pattern,
            per_range,
        } => {
            let mode = if per_range {
                SplitMode::FilePerRange
            } else {
                SplitMode::SingleFile
            };
            let parsed = parse_ranges(&ranges)?;
            let outputs = split(&read(&input)?, &parsed, mode)?;
            write_numbered(&pattern, &outputs)?;
            println!("Wrote {} file(s)", outputs.len());
        }

        Commands::Chunk {
            input,
            pages,
            pattern,
        } => {
            let outputs = chunk_split(&read(&input)?, pages)?;
            write_numbered(&pattern, &outputs)?;
            println!("Wrote {} chunk(s)", outputs.len());
        }

        Commands::Reorder {
            input,
            output,
            order,
        } => {
            write(&output, &reorder(&read(&input)?, &order)?)?;
            println!("Reordered into {}", output.display());
        }

        Commands::Reverse { input, output } => {
            write(&output, &reverse(&read(&input)?)?)?;
            println!("Reversed into {}", output.display());
        }

        Commands::Duplicate {
            input,
            output,
            ranges,
            count,
        } => {
            let parsed = parse_ranges(&ranges)?;
            write(&output, &duplicate(&read(&input)?, &parsed, count)?)?;
            println!("Duplicated into {}", output.display());
        }

        Commands::Interleave { files, output } => {
            if files.len() < 2 {
                bail!("interleave needs at least two input files");
            }
            let inputs = files.iter().map(read).collect::<Result<Vec<_>>>()?;
            write(&output, &interleave(&inputs)?)?;
            println!("Interleaved {} files into {}", files.len(), output.display());
        }

        Commands::Delete {
            input,
            output,
            ranges,
            odd,
            even,
        } => {
            let selection = if odd {
                DeleteSelection::OddPages
            } else if even {
                DeleteSelection::EvenPages
            } else {
                let spec = ranges.context("pass --ranges, --odd or --even")?;
                DeleteSelection::Ranges(parse_ranges(&spec)?)
            };
            write(&output, &delete_pages(&read(&input)?, &selection)?)?;
            println!("Deleted pages into {}", output.display());
        }

        Commands::Rotate {
            input,
            output,
            angle,
            pages,
        } => {
            let angle = RotationAngle::from_degrees(angle)?;
            let ranges = pages.as_deref().map(parse_ranges).transpose()?;
            write(
                &output,
                &rotate(&read(&input)?, angle, ranges.as_deref())?,
            )?;
            println!("Rotated into {}", output.display());
        }

        Commands::Watermark {
            input,
            output,
            text,
            opacity,
            angle,
            size,
        } => {
            let options = WatermarkOptions {
                text,
                opacity,
                angle_degrees: angle,
                font_size: size,
                ranges: None,
            };
            write(&output, &watermark_text(&read(&input)?, &options)?)?;
            println!("Watermarked into {}", output.display());
        }

        Commands::PageNumbers {
            input,
            output,
            start,
            prefix,
            position,
        } => {
            let options = PageNumberOptions {
                start_at: start,
                prefix,
                position: parse_position(&position)?,
                ..PageNumberOptions::default()
            };
            write(&output, &page_numbers(&read(&input)?, &options)?)?;
            println!("Numbered into {}", output.display());
        }

        Commands::HeaderFooter {
            input,
            output,
            header,
            footer,
            date,
            no_page_numbers,
        } => {
            let options = HeaderFooterOptions {
                header_text: header,
                footer_text: footer,
                include_date: date,
                include_page_numbers: !no_page_numbers,
                ..HeaderFooterOptions::default()
            };
            write(&output, &header_footer(&read(&input)?, &options)?)?;
            println!("Annotated into {}", output.display());
        }

        Commands::Stamp {
            input,
            output,
            image,
            page,
            rect,
        } => {
            if page == 0 {
                bail!("pages are numbered from 1");
            }
            let placement = parse_rect(&rect)?;
            let image_bytes = read(&image)?;
            write(
                &output,
                &stamp_image(&read(&input)?, &image_bytes, page - 1, placement)?,
            )?;
            println!("Stamped into {}", output.display());
        }

        Commands::Info { input } => {
            let bytes = read(&input)?;
            let pages = page_count(&bytes)?;
            println!("File:  {}", input.display());
            println!("Size:  {} bytes", bytes.len());
            println!("Pages: {pages}");
        }
    }

    Ok(())
}

fn read(path: &PathBuf) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn write_numbered(pattern: &str, outputs: &[Vec<u8>]) -> Result<()> {
    for (index, bytes) in outputs.iter().enumerate() {
        write(&output_path_for(pattern, index + 1), bytes)?;
    }
    Ok(())
}

fn output_path_for(pattern: &str, number: usize) -> PathBuf {
    if pattern.contains("{}") {
        PathBuf::from(pattern.replace("{}", &number.to_string()))
    } else {
        PathBuf::from(format!("{pattern}.{number}"))
    }
}

fn parse_position(value: &str) -> Result<AnchorPosition> {
    Ok(match value {
        "top-left" => AnchorPosition::TopLeft,
        "top-center" => AnchorPosition::TopCenter,
        "top-right" => AnchorPosition::TopRight,
        "bottom-left" => AnchorPosition::BottomLeft,
        "bottom-center" => AnchorPosition::BottomCenter,
        "bottom-right" => AnchorPosition::BottomRight,
        other => bail!("unknown position \"{other}\""),
    })
}

fn parse_rect(value: &str) -> Result<Rect> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .context("rect must be four numbers: x,y,width,height")?;
    if parts.len() != 4 {
        bail!("rect must be four numbers: x,y,width,height");
    }
    Ok(Rect::new(parts[0], parts[1], parts[2], parts[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_path_substitutes_number() {
        assert_eq!(
            output_path_for("part_{}.pdf", 3),
            PathBuf::from("part_3.pdf")
        );
        assert_eq!(output_path_for("out.pdf", 2), PathBuf::from("out.pdf.2"));
    }

    #[test]
    fn test_parse_rect() {
        let rect = parse_rect("10, 20, 110.5, 40").unwrap();
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.y, 20.0);
        assert_eq!(rect.width, 110.5);
        assert_eq!(rect.height, 40.0);

        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_position() {
        assert!(matches!(
            parse_position("top-right").unwrap(),
            AnchorPosition::TopRight
        ));
        assert!(parse_position("middle").is_err());
    }
}
