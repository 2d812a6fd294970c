//! Answer-sheet reading on top of `omr-core` and `omr-markers`.
//!
//! - [`generate_layout`] turns a [`FormConfig`] into a normalized bubble grid.
//! - [`SheetReader`] evaluates one image: markers, rectification, bubble fill
//!   ratios, per-question decisions and grading.
//! - [`derive_answer_key`] reads the key off a reference sheet.
//! - [`BatchRunner`] evaluates many images in parallel and fills a CSV table.
//! - [`render_sheet`] draws sheets for references and fixtures.
//!
//! ## Quickstart
//!
//! ```no_run
//! use omr_sheet::{load_image, BatchRunner, OmrConfig, SheetReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = OmrConfig::load_json("omr.json")?;
//! let reader = SheetReader::new(cfg.layout()?, cfg.params.clone());
//! let runner = BatchRunner::new(reader, 4);
//! let key = runner.answer_key("reference.png".as_ref())?;
//!
//! let scan = load_image("scan.png")?;
//! let result = runner.reader().evaluate(&scan.view(), Some(&key))?;
//! println!("correct={} wrong={}", result.correct, result.wrong);
//! # Ok(())
//! # }
//! ```

mod answer_key;
mod batch;
mod io;
mod layout;
mod reader;
mod render;

pub use answer_key::{derive_answer_key, AnswerKey, BaseReferenceError, KeyParseError};
pub use batch::{BatchError, BatchJob, BatchRunner, BatchSummary, ResultRow};
pub use io::{
    load_image, read_json, write_json, OmrConfig, OmrIoError, ResultTable, IMAGE_COLUMN,
    OUTPUT_COLUMNS,
};
pub use layout::{
    generate_layout, Choice, DigitBubble, FormConfig, Layout, LayoutError, Question,
    StudentIdBlock,
};
pub use reader::{
    canonical_corners, classify, is_readable, read_student_number, rectify, score_choice,
    score_question, ChoiceScore, Classification, ClassifyParams, DisplayMark, FormResult,
    Grade, OmrParams, ParamOverrides, QuestionResult, Rectified, RectifyError, RectifyParams,
    ResponseStatus, ScoreParams, SheetError, SuspicionReason, SheetReader, UNREADABLE_DIGIT,
};
pub use render::{render_sheet, RenderParams, SheetMarks};
