use omr_core::BinaryImage;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::assign::assign_quadrants;
use crate::candidates::find_candidates;
use crate::{Corners, MarkerCandidate, MarkerDetectError, MarkerParams, QuadrantSlots};

/// Output of a successful detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetectionResult {
    pub corners: Corners,
    pub slots: QuadrantSlots,
    /// Every candidate that passed the shape filters.
    pub candidates: Vec<MarkerCandidate>,
}

/// Corner fiducial detector over binarized sheet images.
#[derive(Clone, Debug, Default)]
pub struct MarkerDetector {
    params: MarkerParams,
}

impl MarkerDetector {
    pub fn new(params: MarkerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MarkerParams {
        &self.params
    }

    /// Shape-filtered candidates only, no quadrant assignment.
    pub fn candidates(&self, binary: &BinaryImage) -> Vec<MarkerCandidate> {
        find_candidates(binary, &self.params)
    }

    /// Locate the four corner markers.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, binary), fields(width = binary.width, height = binary.height))
    )]
    pub fn detect(&self, binary: &BinaryImage) -> Result<MarkerDetectionResult, MarkerDetectError> {
        let candidates = self.candidates(binary);
        if candidates.len() < 4 {
            log::debug!("marker detection failed: {} candidates", candidates.len());
            return Err(MarkerDetectError::TooFewCandidates {
                found: candidates.len(),
            });
        }

        let slots = assign_quadrants(&candidates, binary.width, binary.height);
        let corners = slots.to_corners().map_err(|quadrant| {
            log::debug!("marker detection failed: empty {quadrant} quadrant");
            MarkerDetectError::EmptyQuadrant { quadrant }
        })?;

        Ok(MarkerDetectionResult {
            corners,
            slots,
            candidates,
        })
    }
}
