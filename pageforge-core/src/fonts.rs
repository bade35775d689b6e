//! Metrics for the standard Helvetica font used by overlay text.
//!
//! Overlay operations only ever draw with Helvetica, so a single AFM advance
//! table is enough to center and right-align strings without embedding a font
//! program.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Advance widths in 1/1000 em for the printable ASCII range.
const HELVETICA_AFM: [(u8, u16); 95] = [
    (b' ', 278),
    (b'!', 278),
    (b'"', 355),
    (b'#', 556),
    (b'$', 556),
    (b'%', 889),
    (b'&', 667),
    (b'\'', 191),
    (b'(', 333),
    (b')', 333),
    (b'*', 389),
    (b'+', 584),
    (b',', 278),
    (b'-', 333),
    (b'.', 278),
    (b'/', 278),
    (b'0', 556),
    (b'1', 556),
    (b'2', 556),
    (b'3', 556),
    (b'4', 556),
    (b'5', 556),
    (b'6', 556),
    (b'7', 556),
    (b'8', 556),
    (b'9', 556),
    (b':', 278),
    (b';', 278),
    (b'<', 584),
    (b'=', 584),
    (b'>', 584),
    (b'?', 556),
    (b'@', 1015),
    (b'A', 667),
    (b'B', 667),
    (b'C', 722),
    (b'D', 722),
    (b'E', 667),
    (b'F', 611),
    (b'G', 778),
    (b'H', 722),
    (b'I', 278),
    (b'J', 500),
    (b'K', 667),
    (b'L', 556),
    (b'M', 833),
    (b'N', 722),
    (b'O', 778),
    (b'P', 667),
    (b'Q', 778),
    (b'R', 722),
    (b'S', 667),
    (b'T', 611),
    (b'U', 722),
    (b'V', 667),
    (b'W', 944),
    (b'X', 667),
    (b'Y', 667),
    (b'Z', 611),
    (b'[', 278),
    (b'\\', 278),
    (b']', 278),
    (b'^', 469),
    (b'_', 556),
    (b'`', 333),
    (b'a', 556),
    (b'b', 556),
    (b'c', 500),
    (b'd', 556),
    (b'e', 556),
    (b'f', 278),
    (b'g', 556),
    (b'h', 556),
    (b'i', 222),
    (b'j', 222),
    (b'k', 500),
    (b'l', 222),
    (b'm', 833),
    (b'n', 556),
    (b'o', 556),
    (b'p', 556),
    (b'q', 556),
    (b'r', 333),
    (b's', 500),
    (b't', 278),
    (b'u', 556),
    (b'v', 500),
    (b'w', 722),
    (b'x', 500),
    (b'y', 500),
    (b'z', 500),
    (b'{', 334),
    (b'|', 260),
    (b'}', 334),
    (b'~', 584),
];

/// Fallback advance for characters outside the table
const DEFAULT_ADVANCE: u16 = 556;

lazy_static! {
    static ref HELVETICA_WIDTHS: HashMap<u8, u16> = HELVETICA_AFM.iter().copied().collect();
}

/// Width of `text` rendered in Helvetica at `font_size` points.
pub(crate) fn helvetica_width(text: &str, font_size: f64) -> f64 {
    let units: u64 = text
        .chars()
        .map(|c| {
            if c.is_ascii() {
                u64::from(
                    *HELVETICA_WIDTHS
                        .get(&(c as u8))
                        .unwrap_or(&DEFAULT_ADVANCE),
                )
            } else {
                u64::from(DEFAULT_ADVANCE)
            }
        })
        .sum();
    units as f64 * font_size / 1000.0
}
