use omr_core::BinaryImage;
use serde::{Deserialize, Serialize};

use super::params::ScoreParams;
use crate::layout::{Choice, Question};

/// Fill ratio measured for one choice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoiceScore {
    pub label: char,
    /// Foreground fraction inside the sampling mask, in `[0, 1]`.
    pub score: f32,
}

/// Pixel rectangle clipped to the image, `x + w <= width` and `y + h <= height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelRoi {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Centered ROI of `size_x × size_y` normalized units around `(cx, cy)`,
/// scaled by `scale`. `None` when nothing remains after clipping.
pub(crate) fn roi_around(
    width: usize,
    height: usize,
    center: (f32, f32),
    size: (f32, f32),
    scale: f32,
) -> Option<PixelRoi> {
    let (x, y, roi_w, roi_h) = nominal_roi(width, height, center, size, scale);
    let (x, y) = (x.max(0), y.max(0));
    let w = roi_w.min(width as i64 - x);
    let h = roi_h.min(height as i64 - y);
    if w <= 0 || h <= 0 {
        return None;
    }
    Some(PixelRoi {
        x: x as usize,
        y: y as usize,
        w: w as usize,
        h: h as usize,
    })
}

/// Like [`roi_around`] but `None` unless the whole box lies inside the image.
pub(crate) fn roi_inside(
    width: usize,
    height: usize,
    center: (f32, f32),
    size: (f32, f32),
    scale: f32,
) -> Option<PixelRoi> {
    let (x, y, w, h) = nominal_roi(width, height, center, size, scale);
    let fits = x >= 0 && y >= 0 && w > 0 && h > 0;
    if !fits || x + w > width as i64 || y + h > height as i64 {
        return None;
    }
    Some(PixelRoi {
        x: x as usize,
        y: y as usize,
        w: w as usize,
        h: h as usize,
    })
}

/// Pixel origin and size before clipping.
fn nominal_roi(
    width: usize,
    height: usize,
    (cx, cy): (f32, f32),
    (size_x, size_y): (f32, f32),
    scale: f32,
) -> (i64, i64, i64, i64) {
    let (wf, hf) = (width as f32, height as f32);
    let roi_w = (size_x * wf * scale).round() as i64;
    let roi_h = (size_y * hf * scale).round() as i64;
    let x = (cx * wf - roi_w as f32 * 0.5).round() as i64;
    let y = (cy * hf - roi_h as f32 * 0.5).round() as i64;
    (x, y, roi_w, roi_h)
}

/// Fill ratio of one bubble in a rectified binary image.
///
/// The ROI is the bubble box enlarged by `roi_scale` and clipped to the
/// image; the ratio is taken over a centered disk of radius
/// `floor(min(w, h) * mask_ratio)`. Empty ROIs and masks score 0.
pub fn score_choice(binary: &BinaryImage, choice: &Choice, params: &ScoreParams) -> f32 {
    let Some(roi) = roi_around(
        binary.width,
        binary.height,
        (choice.x, choice.y),
        (choice.width, choice.height),
        params.roi_scale,
    ) else {
        return 0.0;
    };

    let r = (roi.w.min(roi.h) as f32 * params.mask_ratio).floor().max(0.0) as i64;
    let (mcx, mcy) = ((roi.w / 2) as i64, (roi.h / 2) as i64);
    let r2 = r * r;

    let mut total = 0usize;
    let mut ink = 0usize;
    for dy in 0..roi.h {
        let oy = dy as i64 - mcy;
        for dx in 0..roi.w {
            let ox = dx as i64 - mcx;
            if ox * ox + oy * oy > r2 {
                continue;
            }
            total += 1;
            if binary.is_foreground(roi.x + dx, roi.y + dy) {
                ink += 1;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        ink as f32 / total as f32
    }
}

/// Plain ROI ratio: nominal box, no enlargement, no mask.
pub(crate) fn box_ratio(roi: &PixelRoi, binary: &BinaryImage) -> f32 {
    let mut ink = 0usize;
    for y in roi.y..roi.y + roi.h {
        for x in roi.x..roi.x + roi.w {
            if binary.is_foreground(x, y) {
                ink += 1;
            }
        }
    }
    ink as f32 / (roi.w * roi.h) as f32
}

/// Score every choice of `question`, in layout order.
pub fn score_question(
    binary: &BinaryImage,
    question: &Question,
    params: &ScoreParams,
) -> Vec<ChoiceScore> {
    question
        .choices
        .iter()
        .map(|c| ChoiceScore {
            label: c.label,
            score: score_choice(binary, c, params),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_at(x: f32, y: f32) -> Choice {
        Choice {
            label: 'A',
            x,
            y,
            width: 0.14,
            height: 0.14,
        }
    }

    #[test]
    fn background_roi_scores_zero() {
        let img = BinaryImage::new(100, 100);
        let s = score_choice(&img, &choice_at(0.5, 0.5), &ScoreParams::default());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn full_mask_scores_one() {
        // Ink only inside a disk slightly larger than the mask.
        let img = BinaryImage::from_fn(100, 100, |x, y| {
            let (dx, dy) = (x as i32 - 50, y as i32 - 50);
            dx * dx + dy * dy <= 36
        });
        let s = score_choice(&img, &choice_at(0.5, 0.5), &ScoreParams::default());
        assert_eq!(s, 1.0);
    }

    #[test]
    fn half_filled_mask_is_partial() {
        let img = BinaryImage::from_fn(100, 100, |x, _| x < 50);
        let s = score_choice(&img, &choice_at(0.5, 0.5), &ScoreParams::default());
        assert!(s > 0.3 && s < 0.7, "{s}");
    }

    #[test]
    fn roi_outside_image_scores_zero() {
        let img = BinaryImage::from_fn(100, 100, |_, _| true);
        let s = score_choice(&img, &choice_at(1.5, 0.5), &ScoreParams::default());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn roi_is_clipped_at_the_border() {
        let roi = roi_around(100, 100, (0.98, 0.5), (0.14, 0.14), 1.0).expect("roi");
        assert_eq!(roi.x + roi.w, 100);
        assert!(roi.w < 14);
        assert_eq!(roi.h, 14);
    }

    #[test]
    fn roi_inside_rejects_partial_boxes() {
        assert_eq!(roi_inside(100, 100, (0.98, 0.5), (0.14, 0.14), 1.0), None);
        assert_eq!(roi_inside(100, 100, (0.02, 0.5), (0.14, 0.14), 1.0), None);
        let roi = roi_inside(100, 100, (0.5, 0.5), (0.14, 0.14), 1.0).expect("roi");
        assert_eq!(
            roi,
            PixelRoi {
                x: 43,
                y: 43,
                w: 14,
                h: 14
            }
        );
    }
}
