//! Core types and utilities for answer-sheet OMR.
//!
//! This crate is intentionally small: raw image views, the 4-point
//! homography with perspective resampling, and ink binarization. It knows
//! nothing about forms, markers or answers.

mod binarize;
mod buffer;
mod homography;
mod logger;

pub use binarize::{binarize, BinarizeParams};
pub use buffer::{
    sample_bilinear, BinaryImage, GrayImage, GrayImageView, PixelImage, PixelImageView,
};
pub use homography::{
    homography_from_4pt, is_convex_quad, min_triangle_area, polygon_area, warp_perspective,
    Homography,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_filter, init_with_level, LogFilter, LOG_ENV};
