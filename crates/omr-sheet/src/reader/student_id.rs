use omr_core::BinaryImage;

use super::score::{box_ratio, roi_inside};
use crate::layout::StudentIdBlock;

/// Glyph used for a column with no digit at or above the threshold.
pub const UNREADABLE_DIGIT: char = '?';

/// Read the student-number grid of a rectified binary image.
///
/// Each column yields its best-scoring digit when that score reaches
/// `threshold`, otherwise [`UNREADABLE_DIGIT`]. Bubbles whose box is not
/// entirely inside the image are skipped. Returns `None` for a block without
/// digits.
pub fn read_student_number(
    binary: &BinaryImage,
    block: &StudentIdBlock,
    threshold: f32,
) -> Option<String> {
    if block.digits == 0 {
        return None;
    }

    let mut out = String::with_capacity(block.digits as usize);
    for column in 0..block.digits {
        let mut best: Option<(u8, f32)> = None;
        for bubble in block.column(column) {
            let Some(roi) = roi_inside(
                binary.width,
                binary.height,
                (bubble.x, bubble.y),
                (bubble.width, bubble.height),
                1.0,
            ) else {
                continue;
            };
            let score = box_ratio(&roi, binary);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((bubble.digit, score));
            }
        }

        match best {
            Some((digit, score)) if score >= threshold => out.push(char::from(b'0' + digit)),
            _ => out.push(UNREADABLE_DIGIT),
        }
    }
    Some(out)
}

/// Whether every digit of a read student number was recognized.
pub fn is_readable(student_no: &str) -> bool {
    !student_no.contains(UNREADABLE_DIGIT)
}
