//! Single-sheet evaluation pipeline.
//!
//! This module wires together binarization, marker detection, perspective
//! rectification, bubble scoring and response classification.

mod classify;
mod error;
mod params;
mod pipeline;
mod rectify;
mod result;
mod score;
mod student_id;

pub use classify::{classify, Classification, DisplayMark, Grade, ResponseStatus};
pub use error::SheetError;
pub use params::{ClassifyParams, OmrParams, ParamOverrides, RectifyParams, ScoreParams};
pub use pipeline::SheetReader;
pub use rectify::{canonical_corners, rectify, Rectified, RectifyError};
pub use result::{FormResult, QuestionResult, SuspicionReason};
pub use score::{score_choice, score_question, ChoiceScore};
pub use student_id::{is_readable, read_student_number, UNREADABLE_DIGIT};
