use crate::Quadrant;

/// Errors returned by the marker detector.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MarkerDetectError {
    #[error("only {found} marker candidates found, need at least 4")]
    TooFewCandidates { found: usize },
    #[error("no marker candidate in the {quadrant} quadrant")]
    EmptyQuadrant { quadrant: Quadrant },
}
