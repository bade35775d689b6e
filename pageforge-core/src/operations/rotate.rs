//! Page rotation.
//!
//! Rotation is stored in the page dictionary's rotation entry, so this
//! operation never copies content; it only adjusts metadata on the selected
//! pages. Rotation is additive: rotating a 90-degree page by 90 yields 180.

use tracing::debug;

use super::{resolve_page_indexes, OperationError, OperationResult, PageRange};
use crate::document::PdfFile;

/// Rotation step applied on top of a page's current rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAngle {
    /// 90 degrees clockwise
    Clockwise90,
    /// 180 degrees
    Rotate180,
    /// 270 degrees clockwise (90 counter-clockwise)
    Clockwise270,
}

impl RotationAngle {
    /// Create from degrees; only quarter turns are representable
    pub fn from_degrees(degrees: i32) -> OperationResult<Self> {
        match degrees.rem_euclid(360) {
            90 => Ok(RotationAngle::Clockwise90),
            180 => Ok(RotationAngle::Rotate180),
            270 => Ok(RotationAngle::Clockwise270),
            _ => Err(OperationError::InvalidRotation(degrees)),
        }
    }

    /// Convert to degrees
    pub fn to_degrees(self) -> i64 {
        match self {
            RotationAngle::Clockwise90 => 90,
            RotationAngle::Rotate180 => 180,
            RotationAngle::Clockwise270 => 270,
        }
    }
}

/// Add `angle` to the rotation of every selected page (all pages when
/// `ranges` is `None`).
pub fn rotate(
    bytes: &[u8],
    angle: RotationAngle,
    ranges: Option<&[PageRange]>,
) -> OperationResult<Vec<u8>> {
    let mut file = PdfFile::load(bytes)?;
    let indices = resolve_page_indexes(ranges, file.page_count())?;

    debug!(
        pages = indices.len(),
        degrees = angle.to_degrees(),
        "rotating pages"
    );
    for index in indices {
        let current = file.rotation(index)?;
        file.set_rotation(index, (current + angle.to_degrees()) % 360)?;
    }
    file.save()
}
