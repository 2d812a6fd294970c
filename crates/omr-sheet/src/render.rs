//! Raster answer sheets drawn from a [`Layout`].
//!
//! Used for reference images, fixtures and benchmarks. Question labels and
//! the QR block are not drawn.

use std::collections::BTreeMap;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::answer_key::AnswerKey;
use crate::layout::Layout;
use crate::reader::RectifyParams;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    /// Output pixels per form unit.
    pub scale: f32,
    /// Side of the white notch cut into each marker's inward corner.
    pub marker_notch: f32,
    /// Bubble outline width, form units.
    pub ring_width: f32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            scale: 2.0,
            marker_notch: 6.0,
            ring_width: 1.2,
        }
    }
}

/// What to fill in on a rendered sheet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetMarks {
    pub answers: BTreeMap<u32, Vec<char>>,
    pub student_no: Option<String>,
}

impl SheetMarks {
    pub fn from_key(key: &AnswerKey) -> Self {
        Self {
            answers: key.answers.iter().map(|(&q, &c)| (q, vec![c])).collect(),
            student_no: None,
        }
    }

    pub fn with_mark(mut self, question: u32, option: char) -> Self {
        self.answers.entry(question).or_default().push(option);
        self
    }

    pub fn with_student_no(mut self, digits: impl Into<String>) -> Self {
        self.student_no = Some(digits.into());
        self
    }

    fn is_marked(&self, question: u32, option: char) -> bool {
        self.answers
            .get(&question)
            .is_some_and(|opts| opts.contains(&option))
    }
}

struct Canvas {
    img: RgbImage,
    scale: f32,
}

impl Canvas {
    fn px(&self, v: f32) -> i32 {
        (v * self.scale).round() as i32
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb<u8>) {
        let (pw, ph) = (self.px(w), self.px(h));
        if pw <= 0 || ph <= 0 {
            return;
        }
        let r = Rect::at(self.px(x), self.px(y)).of_size(pw as u32, ph as u32);
        draw_filled_rect_mut(&mut self.img, r, color);
    }

    fn disk(&mut self, cx: f32, cy: f32, r: f32, color: Rgb<u8>) {
        let (center, r) = ((self.px(cx), self.px(cy)), self.px(r));
        if r > 0 {
            draw_filled_circle_mut(&mut self.img, center, r, color);
        }
    }

    fn bubble(&mut self, cx: f32, cy: f32, r: f32, ring: f32, filled: bool) {
        self.disk(cx, cy, r, BLACK);
        if !filled {
            let inner = (self.px(r) - self.px(ring).max(1)).max(0);
            if inner > 0 {
                let center = (self.px(cx), self.px(cy));
                draw_filled_circle_mut(&mut self.img, center, inner, WHITE);
            }
        }
    }
}

/// Draw the sheet at `params.scale` pixels per form unit.
pub fn render_sheet(
    layout: &Layout,
    marks: &SheetMarks,
    rectify: &RectifyParams,
    params: &RenderParams,
) -> RgbImage {
    let (fw, fh) = (layout.width as f32, layout.height as f32);
    let scale = params.scale.max(0.01);
    let w = (fw * scale).round().max(1.0) as u32;
    let h = (fh * scale).round().max(1.0) as u32;
    let mut c = Canvas {
        img: RgbImage::from_pixel(w, h, WHITE),
        scale,
    };

    let (off, size) = (rectify.marker_offset, rectify.marker_size);
    let notch = params.marker_notch.min(size);
    let near = off;
    let far_x = fw - off - size;
    let far_y = fh - off - size;
    // (marker origin, notch origin): the notch sits on the inward corner.
    let markers = [
        ((near, near), (near + size - notch, near + size - notch)),
        ((far_x, near), (far_x, near + size - notch)),
        ((near, far_y), (near + size - notch, far_y)),
        ((far_x, far_y), (far_x, far_y)),
    ];
    for ((mx, my), (nx, ny)) in markers {
        c.rect(mx, my, size, size, BLACK);
        c.rect(nx, ny, notch, notch, WHITE);
    }

    for q in &layout.questions {
        for ch in &q.choices {
            let r = (ch.width * fw).min(ch.height * fh) * 0.5 - 1.0;
            let filled = marks.is_marked(q.number, ch.label);
            c.bubble(ch.x * fw, ch.y * fh, r, params.ring_width, filled);
        }
    }

    if let Some(block) = &layout.student_id {
        let digits: Vec<Option<u8>> = marks
            .student_no
            .as_deref()
            .map(|s| s.chars().map(|d| d.to_digit(10).map(|d| d as u8)).collect())
            .unwrap_or_default();
        for b in &block.bubbles {
            let r = b.width * fw * 0.5 - 1.0;
            let filled = digits.get(b.column as usize).copied().flatten() == Some(b.digit);
            c.bubble(b.x * fw, b.y * fh, r, params.ring_width, filled);
        }
    }

    c.img
}
