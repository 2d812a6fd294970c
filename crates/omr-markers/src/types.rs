use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One of the four image quadrants, split at the image center.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Quadrant containing `p`; points on the center lines go right/bottom.
    pub fn of(p: Point2<f32>, width: usize, height: usize) -> Self {
        let left = p.x < width as f32 * 0.5;
        let top = p.y < height as f32 * 0.5;
        match (left, top) {
            (true, true) => Quadrant::TopLeft,
            (false, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomLeft,
            (false, false) => Quadrant::BottomRight,
        }
    }

    /// The image corner this quadrant's marker should be nearest to.
    pub fn image_corner(self, width: usize, height: usize) -> Point2<f32> {
        let (w, h) = (width as f32, height as f32);
        match self {
            Quadrant::TopLeft => Point2::new(0.0, 0.0),
            Quadrant::TopRight => Point2::new(w, 0.0),
            Quadrant::BottomLeft => Point2::new(0.0, h),
            Quadrant::BottomRight => Point2::new(w, h),
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quadrant::TopLeft => "top-left",
            Quadrant::TopRight => "top-right",
            Quadrant::BottomLeft => "bottom-left",
            Quadrant::BottomRight => "bottom-right",
        };
        f.write_str(name)
    }
}

/// Axis-aligned pixel bounding box (inclusive pixel span).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Geometric center in continuous pixel coordinates.
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// A contour that passed the marker shape filters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerCandidate {
    pub center: Point2<f32>,
    pub bbox: BoundingBox,
    /// Contour polygon area in pixels.
    pub area: f32,
    /// Contour area over convex hull area.
    pub solidity: f32,
}

/// Marker centers in source pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_left: Point2<f32>,
    pub bottom_right: Point2<f32>,
}

impl Corners {
    /// Corners as a TL, TR, BR, BL quad.
    pub fn quad(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn get(&self, q: Quadrant) -> Point2<f32> {
        match q {
            Quadrant::TopLeft => self.top_left,
            Quadrant::TopRight => self.top_right,
            Quadrant::BottomLeft => self.bottom_left,
            Quadrant::BottomRight => self.bottom_right,
        }
    }
}

/// Best candidate held by a quadrant slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub candidate: MarkerCandidate,
    /// Distance from the candidate center to the quadrant's image corner.
    pub distance: f32,
}

/// One optional marker per quadrant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadrantSlots {
    slots: [Option<SlotEntry>; 4],
}

impl QuadrantSlots {
    pub fn get(&self, q: Quadrant) -> Option<&SlotEntry> {
        self.slots[q.index()].as_ref()
    }

    pub(crate) fn slot_mut(&mut self, q: Quadrant) -> &mut Option<SlotEntry> {
        &mut self.slots[q.index()]
    }

    /// Quadrants with no candidate, in [`Quadrant::ALL`] order.
    pub fn missing(&self) -> Vec<Quadrant> {
        Quadrant::ALL
            .into_iter()
            .filter(|q| self.get(*q).is_none())
            .collect()
    }

    /// All four slots filled, or the first empty quadrant.
    pub fn to_corners(&self) -> Result<Corners, Quadrant> {
        let center = |q: Quadrant| self.get(q).map(|s| s.candidate.center).ok_or(q);
        Ok(Corners {
            top_left: center(Quadrant::TopLeft)?,
            top_right: center(Quadrant::TopRight)?,
            bottom_left: center(Quadrant::BottomLeft)?,
            bottom_right: center(Quadrant::BottomRight)?,
        })
    }
}
