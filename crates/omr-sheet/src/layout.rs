//! Form configuration and the normalized bubble grid derived from it.
//!
//! All positions in a [`Layout`] are fractions of the form width/height, so
//! the same layout applies to a rectified image of any resolution.

use serde::{Deserialize, Serialize};

/// Width reserved for the QR block left of the student-number grid.
const QR_SIZE: f32 = 60.0;
/// Gap between the QR block and the student-number grid.
const QR_GAP: f32 = 15.0;
/// Horizontal offset from a column's left edge to its first choice.
const LABEL_OFFSET: f32 = 25.0;
const MAX_CHOICES: u32 = 26;

/// Physical form description, in form units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub question_count: u32,
    pub choice_count: u32,
    pub column_count: u32,
    /// Student-number digits (`0` disables the block).
    pub student_digits: u32,
    pub form_width: u32,
    pub form_height: u32,
    pub bubble_size: u32,
    pub row_gap: u32,
    /// Every `header_repeat` rows a header band is inserted (`0` disables).
    pub header_repeat: u32,
    pub margin: u32,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            question_count: 30,
            choice_count: 5,
            column_count: 2,
            student_digits: 10,
            form_width: 350,
            form_height: 550,
            bubble_size: 14,
            row_gap: 4,
            header_repeat: 5,
            margin: 15,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("{field} must be positive")]
    ZeroCount { field: &'static str },
    #[error("at most 26 choices per question are supported, got {0}")]
    TooManyChoices(u32),
    #[error("bubble {label} of {owner} falls outside the form")]
    OutOfBounds { owner: String, label: String },
}

/// One answer bubble, normalized to the layout dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: char,
    /// Center x in `(0, 1)`.
    pub x: f32,
    /// Center y in `(0, 1)`.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based question number.
    pub number: u32,
    pub choices: Vec<Choice>,
}

/// One bubble of the student-number grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigitBubble {
    /// Digit position, left to right.
    pub column: u32,
    pub digit: u8,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentIdBlock {
    pub digits: u32,
    /// Column-major: all ten digits of column 0, then column 1, ...
    pub bubbles: Vec<DigitBubble>,
}

impl StudentIdBlock {
    pub fn column(&self, column: u32) -> impl Iterator<Item = &DigitBubble> {
        self.bubbles.iter().filter(move |b| b.column == column)
    }
}

/// Immutable normalized geometry of one form configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Canonical width in form units (also the rectified image width in px).
    pub width: u32,
    pub height: u32,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub student_id: Option<StudentIdBlock>,
}

impl Layout {
    pub fn question(&self, number: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.number == number)
    }

    pub fn choice_count(&self) -> usize {
        self.questions.iter().map(|q| q.choices.len()).sum()
    }
}

impl FormConfig {
    /// Reject configurations that cannot produce a usable layout.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let counts = [
            ("question_count", self.question_count),
            ("choice_count", self.choice_count),
            ("column_count", self.column_count),
            ("form_width", self.form_width),
            ("form_height", self.form_height),
            ("bubble_size", self.bubble_size),
        ];
        if let Some(&(field, _)) = counts.iter().find(|(_, v)| *v == 0) {
            return Err(LayoutError::ZeroCount { field });
        }
        if self.choice_count > MAX_CHOICES {
            return Err(LayoutError::TooManyChoices(self.choice_count));
        }

        let layout = generate_layout(self);
        for q in &layout.questions {
            for c in &q.choices {
                if !inside(c.x, c.y, c.width, c.height) {
                    return Err(LayoutError::OutOfBounds {
                        owner: format!("question {}", q.number),
                        label: c.label.to_string(),
                    });
                }
            }
        }
        if let Some(block) = &layout.student_id {
            for b in &block.bubbles {
                if !inside(b.x, b.y, b.width, b.height) {
                    return Err(LayoutError::OutOfBounds {
                        owner: format!("student number column {}", b.column),
                        label: b.digit.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn digit_size(&self) -> f32 {
        (self.bubble_size as f32 - 2.0).min(12.0)
    }

    fn student_origin(&self) -> (f32, f32) {
        let m = self.margin as f32;
        (m + QR_SIZE + QR_GAP, m + 10.0)
    }

    fn header_height(&self) -> f32 {
        20.0 + 10.0 * (self.digit_size() + 2.0) + 15.0
    }
}

fn inside(x: f32, y: f32, w: f32, h: f32) -> bool {
    x - w * 0.5 > 0.0 && x + w * 0.5 < 1.0 && y - h * 0.5 > 0.0 && y + h * 0.5 < 1.0
}

/// Build the deterministic bubble grid for `cfg`.
///
/// Never fails; pair with [`FormConfig::validate`] to reject geometry that
/// leaves the form.
pub fn generate_layout(cfg: &FormConfig) -> Layout {
    let fw = cfg.form_width.max(1) as f32;
    let fh = cfg.form_height.max(1) as f32;
    let columns = cfg.column_count.max(1);
    let bubble = cfg.bubble_size as f32;
    let margin = cfg.margin as f32;

    let per_column = cfg.question_count.div_ceil(columns);
    let column_width = (fw - 2.0 * margin) / columns as f32;
    let row_h = bubble + cfg.row_gap as f32;
    let bubble_gap = bubble + 3.0;

    let (sx, sy) = cfg.student_origin();
    let y0 = sy + cfg.header_height() + 10.0;

    let mut questions = Vec::with_capacity(cfg.question_count as usize);
    for col in 0..columns {
        let label_x = margin + col as f32 * column_width + LABEL_OFFSET;
        let mut band_offset = 0.0;
        for q_idx in 0..per_column {
            let number = col * per_column + q_idx + 1;
            if number > cfg.question_count {
                break;
            }
            if cfg.header_repeat > 0 && q_idx > 0 && q_idx % cfg.header_repeat == 0 {
                band_offset += row_h * 0.8;
            }
            let q_y = y0 + 12.0 + q_idx as f32 * row_h + band_offset;

            let choices = (0..cfg.choice_count.min(MAX_CHOICES))
                .map(|k| Choice {
                    label: char::from(b'A' + k as u8),
                    x: (label_x + k as f32 * bubble_gap) / fw,
                    y: (q_y + bubble * 0.5) / fh,
                    width: bubble / fw,
                    height: bubble / fh,
                })
                .collect();
            questions.push(Question { number, choices });
        }
    }

    let student_id = (cfg.student_digits > 0).then(|| {
        let d = cfg.digit_size();
        let pitch = d + 2.0;
        let mut bubbles = Vec::with_capacity(cfg.student_digits as usize * 10);
        for column in 0..cfg.student_digits {
            for digit in 0..10u8 {
                bubbles.push(DigitBubble {
                    column,
                    digit,
                    x: (sx + column as f32 * pitch + d * 0.5) / fw,
                    y: (sy + 20.0 + digit as f32 * pitch + d * 0.5) / fh,
                    width: d / fw,
                    height: d / fh,
                });
            }
        }
        StudentIdBlock {
            digits: cfg.student_digits,
            bubbles,
        }
    });

    Layout {
        width: cfg.form_width,
        height: cfg.form_height,
        questions,
        student_id,
    }
}
