use serde::{Deserialize, Serialize};

/// Shape filters applied to outer contours before quadrant assignment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerParams {
    /// Minimum contour area as a fraction of the image area (inclusive).
    pub min_area_frac: f32,
    /// Maximum contour area as a fraction of the image area (inclusive).
    pub max_area_frac: f32,
    /// Bounding box width/height must lie strictly inside
    /// `(min_aspect, max_aspect)`.
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Contour area over convex hull area must exceed this value.
    pub min_solidity: f32,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            min_area_frac: 0.0003,
            max_area_frac: 0.02,
            min_aspect: 0.5,
            max_aspect: 2.0,
            min_solidity: 0.6,
        }
    }
}

impl MarkerParams {
    pub(crate) fn area_range(&self, image_area: f32) -> (f32, f32) {
        (self.min_area_frac * image_area, self.max_area_frac * image_area)
    }
}
