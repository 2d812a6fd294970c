//! Outer-contour extraction and shape filtering.

use crate::{BoundingBox, MarkerCandidate, MarkerParams};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use nalgebra::Point2;
use omr_core::{polygon_area, BinaryImage};

/// Collect every outermost contour of `binary` that looks like a solid,
/// roughly square marker.
///
/// Only top-level outer borders are considered, so shapes nested inside
/// another region (notches, bubble interiors) never become candidates.
pub fn find_candidates(binary: &BinaryImage, params: &MarkerParams) -> Vec<MarkerCandidate> {
    if binary.width == 0 || binary.height == 0 {
        return Vec::new();
    }

    let luma = binary.to_luma();
    let contours = find_contours::<i32>(&luma);
    let image_area = (binary.width * binary.height) as f32;

    let out: Vec<MarkerCandidate> = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| evaluate_contour(&c.points, image_area, params))
        .collect();

    log::debug!(
        "marker candidates: {} of {} contours kept",
        out.len(),
        contours.len()
    );
    out
}

fn evaluate_contour(
    points: &[Point<i32>],
    image_area: f32,
    params: &MarkerParams,
) -> Option<MarkerCandidate> {
    if points.len() < 3 {
        return None;
    }

    let poly: Vec<Point2<f32>> = points
        .iter()
        .map(|p| Point2::new(p.x as f32, p.y as f32))
        .collect();
    let area = polygon_area(&poly);
    let (min_area, max_area) = params.area_range(image_area);
    if area < min_area || area > max_area {
        return None;
    }

    let bbox = bounding_box(points)?;
    let aspect = bbox.aspect();
    if aspect <= params.min_aspect || aspect >= params.max_aspect {
        return None;
    }

    let hull: Vec<Point2<f32>> = convex_hull(points)
        .into_iter()
        .map(|p| Point2::new(p.x as f32, p.y as f32))
        .collect();
    let hull_area = polygon_area(&hull);
    if hull_area <= 0.0 {
        return None;
    }
    let solidity = area / hull_area;
    if solidity <= params.min_solidity {
        return None;
    }

    Some(MarkerCandidate {
        center: bbox.center(),
        bbox,
        area,
        solidity,
    })
}

fn bounding_box(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    Some(BoundingBox {
        x: x0,
        y: y0,
        width: (x1 - x0 + 1) as u32,
        height: (y1 - y0 + 1) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(img: &mut BinaryImage, x0: usize, y0: usize, w: usize, h: usize) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.set(x, y, true);
            }
        }
    }

    #[test]
    fn solid_square_is_a_candidate() {
        let mut img = BinaryImage::new(200, 200);
        fill(&mut img, 40, 60, 20, 20);
        let found = find_candidates(&img, &MarkerParams::default());
        assert_eq!(found.len(), 1);
        let c = found[0];
        assert_eq!(
            c.bbox,
            BoundingBox {
                x: 40,
                y: 60,
                width: 20,
                height: 20
            }
        );
        assert!((c.center.x - 50.0).abs() < 1e-6);
        assert!((c.center.y - 70.0).abs() < 1e-6);
        assert!(c.solidity > 0.95);
    }

    #[test]
    fn elongated_and_tiny_shapes_are_rejected() {
        let mut img = BinaryImage::new(200, 200);
        // 60x6 bar: aspect 10.
        fill(&mut img, 20, 20, 60, 6);
        // 2x2 speck: below min area.
        fill(&mut img, 150, 150, 2, 2);
        assert!(find_candidates(&img, &MarkerParams::default()).is_empty());
    }

    #[test]
    fn l_shape_fails_solidity() {
        let mut img = BinaryImage::new(200, 200);
        // Thin L: 30x30 bounding box, arms 3 px wide.
        fill(&mut img, 50, 50, 3, 30);
        fill(&mut img, 50, 77, 30, 3);
        assert!(find_candidates(&img, &MarkerParams::default()).is_empty());
    }

    #[test]
    fn solidity_equal_to_the_minimum_is_rejected() {
        let mut img = BinaryImage::new(200, 200);
        fill(&mut img, 40, 60, 20, 20);
        let solidity = find_candidates(&img, &MarkerParams::default())[0].solidity;

        let at_limit = MarkerParams {
            min_solidity: solidity,
            ..MarkerParams::default()
        };
        assert!(find_candidates(&img, &at_limit).is_empty());

        let below = MarkerParams {
            min_solidity: solidity - 0.01,
            ..MarkerParams::default()
        };
        assert_eq!(find_candidates(&img, &below).len(), 1);
    }

    #[test]
    fn shapes_inside_a_frame_are_ignored() {
        let mut img = BinaryImage::new(200, 200);
        // Closed frame around the whole image interior.
        fill(&mut img, 5, 5, 190, 2);
        fill(&mut img, 5, 193, 190, 2);
        fill(&mut img, 5, 5, 2, 190);
        fill(&mut img, 193, 5, 2, 190);
        fill(&mut img, 40, 40, 20, 20);
        assert!(find_candidates(&img, &MarkerParams::default()).is_empty());
    }
}
