//! High-level facade crate for the `omr-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates (`core`, `markers`, `sheet`)
//! - end-to-end helpers that go from `image` crate types or file paths to a
//!   graded [`FormResult`]
//! - the `omr` command-line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use omr::{evaluate, OmrConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = OmrConfig::default();
//! let reader = evaluate::reader_from_config(&cfg)?;
//! let key = evaluate::key_from_reference(&reader, "reference.png")?;
//! let result = evaluate::evaluate_path(&reader, "scan.jpg", Some(&key))?;
//! println!("correct {} / wrong {} / net {}", result.correct, result.wrong, result.net);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `omr::core`: image views, homography, perspective warp, binarization, logging.
//! - `omr::markers`: corner fiducial detection.
//! - `omr::sheet`: layout, reader pipeline, answer keys, batch runner, renderer.
//! - `omr::evaluate`: helpers over `image::DynamicImage` and paths.

pub use omr_core as core;
pub use omr_markers as markers;
pub use omr_sheet as sheet;

pub use omr_markers::{Corners, MarkerDetector, MarkerParams};
pub use omr_sheet::{
    AnswerKey, BatchRunner, FormConfig, FormResult, Layout, OmrConfig, OmrParams, SheetError,
    SheetReader,
};

pub mod evaluate;
