use crate::{MarkerCandidate, Quadrant, QuadrantSlots, SlotEntry};
use nalgebra::distance;

/// Put each candidate in the quadrant its center falls in and keep, per
/// quadrant, the one closest to that quadrant's image corner.
///
/// Equal distances go to the candidate with the smaller `(y, x)` center, so
/// the outcome does not depend on candidate order.
pub fn assign_quadrants(
    candidates: &[MarkerCandidate],
    width: usize,
    height: usize,
) -> QuadrantSlots {
    let mut slots = QuadrantSlots::default();

    for cand in candidates {
        let q = Quadrant::of(cand.center, width, height);
        let d = distance(&cand.center, &q.image_corner(width, height));
        let slot = slots.slot_mut(q);

        let replace = match slot {
            None => true,
            Some(cur) => {
                d < cur.distance
                    || (d == cur.distance && yx_key(cand) < yx_key(&cur.candidate))
            }
        };
        if replace {
            *slot = Some(SlotEntry {
                candidate: *cand,
                distance: d,
            });
        }
    }

    slots
}

fn yx_key(c: &MarkerCandidate) -> (f32, f32) {
    (c.center.y, c.center.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;
    use nalgebra::Point2;

    fn cand(x: f32, y: f32) -> MarkerCandidate {
        MarkerCandidate {
            center: Point2::new(x, y),
            bbox: BoundingBox {
                x: x as i32 - 5,
                y: y as i32 - 5,
                width: 10,
                height: 10,
            },
            area: 81.0,
            solidity: 1.0,
        }
    }

    #[test]
    fn closest_to_corner_wins_each_quadrant() {
        let cands = [
            cand(40.0, 40.0),
            cand(10.0, 12.0),
            cand(190.0, 10.0),
            cand(150.0, 60.0),
            cand(12.0, 280.0),
            cand(185.0, 285.0),
            cand(120.0, 200.0),
        ];
        let slots = assign_quadrants(&cands, 200, 300);
        let corners = slots.to_corners().expect("all quadrants filled");
        assert_eq!(corners.top_left, Point2::new(10.0, 12.0));
        assert_eq!(corners.top_right, Point2::new(190.0, 10.0));
        assert_eq!(corners.bottom_left, Point2::new(12.0, 280.0));
        assert_eq!(corners.bottom_right, Point2::new(185.0, 285.0));
    }

    #[test]
    fn empty_quadrant_is_reported() {
        let cands = [cand(10.0, 10.0), cand(190.0, 10.0), cand(10.0, 290.0)];
        let slots = assign_quadrants(&cands, 200, 300);
        assert_eq!(slots.missing(), vec![Quadrant::BottomRight]);
        assert_eq!(slots.to_corners(), Err(Quadrant::BottomRight));
    }

    #[test]
    fn ties_resolve_independently_of_order() {
        // Both at distance 20 from the top-left corner.
        let a = cand(12.0, 16.0);
        let b = cand(16.0, 12.0);
        let forward = assign_quadrants(&[a, b], 200, 300);
        let reverse = assign_quadrants(&[b, a], 200, 300);
        let pick = |s: &QuadrantSlots| s.get(Quadrant::TopLeft).map(|e| e.candidate.center);
        assert_eq!(pick(&forward), Some(b.center));
        assert_eq!(pick(&reverse), Some(b.center));
    }
}
