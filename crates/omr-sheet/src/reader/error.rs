use std::path::PathBuf;

use omr_markers::MarkerDetectError;

use super::rectify::RectifyError;

/// Per-image failures. A batch records these as flagged rows and moves on.
#[derive(thiserror::Error, Debug)]
pub enum SheetError {
    #[error("cannot decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("marker not found: {0}")]
    MarkerNotFound(#[from] MarkerDetectError),
    #[error("degenerate transform: {0}")]
    DegenerateTransform(#[from] RectifyError),
}

impl SheetError {
    /// Detection or rectification failed, i.e. the sheet was decoded but
    /// could not be located.
    pub fn is_geometric(&self) -> bool {
        matches!(
            self,
            SheetError::MarkerNotFound(_) | SheetError::DegenerateTransform(_)
        )
    }
}
