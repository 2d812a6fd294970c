use omr_core::BinarizeParams;
use omr_markers::MarkerParams;
use serde::{Deserialize, Serialize};

/// Corner marker placement on the printed form, in form units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyParams {
    /// Distance from the form edge to the marker's outer edge.
    pub marker_offset: f32,
    /// Marker side length.
    pub marker_size: f32,
    /// Reject detected quads smaller than this fraction of the source area.
    pub min_quad_area_frac: f32,
}

impl Default for RectifyParams {
    fn default() -> Self {
        Self {
            marker_offset: 5.0,
            marker_size: 18.0,
            min_quad_area_frac: 0.01,
        }
    }
}

impl RectifyParams {
    /// Offset from a form corner to the matching marker center.
    pub fn inset(&self) -> f32 {
        self.marker_offset + self.marker_size * 0.5
    }
}

/// Bubble sampling geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreParams {
    /// ROI enlargement over the nominal bubble size (> 1).
    pub roi_scale: f32,
    /// Circular mask radius as a fraction of the smaller ROI side (< 1).
    pub mask_ratio: f32,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            roi_scale: 1.04,
            mask_ratio: 0.32,
        }
    }
}

/// Per-question decision thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyParams {
    /// A choice counts as filled at or above this ratio.
    pub fill_threshold: f32,
    /// Below this maximum the question is blank outright.
    pub blank_guard: f32,
    /// With nothing filled, the strongest choice is still taken when its
    /// ratio exceeds this value. `None` turns the fallback off.
    pub salvage_threshold: Option<f32>,
    /// Fraction of `fill_threshold` above which a question with no filled
    /// choice is reported as ambiguous. This holds whether the question stays
    /// blank or is salvaged into a mark, so with the defaults every salvaged
    /// question makes the sheet suspicious.
    pub ambiguous_frac: f32,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            fill_threshold: 0.20,
            blank_guard: 0.18,
            salvage_threshold: Some(0.05),
            ambiguous_frac: 0.6,
        }
    }
}

/// Every tunable of the sheet reader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmrParams {
    pub binarize: BinarizeParams,
    pub marker: MarkerParams,
    pub rectify: RectifyParams,
    pub score: ScoreParams,
    pub classify: ClassifyParams,
    /// Net score deduction per wrong answer.
    pub penalty: f32,
}

impl Default for OmrParams {
    fn default() -> Self {
        Self {
            binarize: BinarizeParams::default(),
            marker: MarkerParams::default(),
            rectify: RectifyParams::default(),
            score: ScoreParams::default(),
            classify: ClassifyParams::default(),
            penalty: 0.25,
        }
    }
}

/// Per-run overrides of the sweepable parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamOverrides {
    pub fill_threshold: Option<f32>,
    pub roi_scale: Option<f32>,
    pub mask_ratio: Option<f32>,
    pub block_size: Option<u32>,
}

impl ParamOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, base: &OmrParams) -> OmrParams {
        let mut out = base.clone();
        if let Some(v) = self.fill_threshold {
            out.classify.fill_threshold = v;
        }
        if let Some(v) = self.roi_scale {
            out.score.roi_scale = v;
        }
        if let Some(v) = self.mask_ratio {
            out.score.mask_ratio = v;
        }
        if let Some(v) = self.block_size {
            out.binarize.block_size = v;
        }
        out
    }
}
