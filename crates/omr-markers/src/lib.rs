//! Corner fiducial detection for answer sheets.
//!
//! Pipeline:
//! - outer contours of the binarized image are shape-filtered into
//!   [`MarkerCandidate`]s (area, aspect, solidity),
//! - candidates are split into image quadrants and the one nearest each image
//!   corner wins its [`QuadrantSlots`] entry,
//! - four filled slots become [`Corners`].
//!
//! ## Quickstart
//!
//! ```no_run
//! use omr_core::{binarize, BinarizeParams, GrayImage};
//! use omr_markers::MarkerDetector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gray = GrayImage { width: 700, height: 1100, data: vec![255; 700 * 1100] };
//! let binary = binarize(&gray.view(), &BinarizeParams::default());
//! let detection = MarkerDetector::default().detect(&binary)?;
//! println!("top-left marker at {:?}", detection.corners.top_left);
//! # Ok(())
//! # }
//! ```

mod assign;
mod candidates;
mod detector;
mod error;
mod params;
mod types;

pub use assign::assign_quadrants;
pub use candidates::find_candidates;
pub use detector::{MarkerDetectionResult, MarkerDetector};
pub use error::MarkerDetectError;
pub use params::MarkerParams;
pub use types::{BoundingBox, Corners, MarkerCandidate, Quadrant, QuadrantSlots, SlotEntry};
