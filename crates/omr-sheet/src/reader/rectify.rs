use nalgebra::Point2;
use omr_core::{
    homography_from_4pt, is_convex_quad, min_triangle_area, polygon_area, warp_perspective,
    Homography, PixelImage, PixelImageView,
};
use omr_markers::Corners;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::params::RectifyParams;

/// Smallest triangle (px²) any three detected corners may span.
const MIN_TRIANGLE_AREA: f32 = 1.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RectifyError {
    #[error("marker corners are collinear or coincident (min triangle area {min_triangle_area:.3} px²)")]
    Collinear { min_triangle_area: f32 },
    #[error("marker corners do not form a convex quad")]
    NotConvex,
    #[error("marker quad covers {area:.1} px², below the {min_area:.1} px² minimum")]
    QuadTooSmall { area: f32, min_area: f32 },
    #[error("marker corners do not define a projective transform")]
    Singular,
    #[error("layout has zero size")]
    EmptyTarget,
}

/// Sheet image resampled into layout space.
#[derive(Clone, Debug)]
pub struct Rectified {
    /// Exactly layout width × height, same channel count as the source.
    pub image: PixelImage,
    /// Maps rectified pixel coordinates back into the source image.
    pub h_src_from_rect: Homography,
}

/// Marker centers in layout space, TL, TR, BR, BL.
pub fn canonical_corners(width: u32, height: u32, params: &RectifyParams) -> [Point2<f32>; 4] {
    let (w, h) = (width as f32, height as f32);
    let m = params.inset();
    [
        Point2::new(m, m),
        Point2::new(w - m, m),
        Point2::new(w - m, h - m),
        Point2::new(m, h - m),
    ]
}

/// Warp `src` so the detected markers land on their canonical positions.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, corners, params), fields(src_w = src.width, src_h = src.height))
)]
pub fn rectify(
    src: &PixelImageView<'_>,
    corners: &Corners,
    width: u32,
    height: u32,
    params: &RectifyParams,
) -> Result<Rectified, RectifyError> {
    if width == 0 || height == 0 {
        return Err(RectifyError::EmptyTarget);
    }

    let quad = corners.quad();
    let tri = min_triangle_area(&quad);
    if tri.is_nan() || tri < MIN_TRIANGLE_AREA {
        return Err(RectifyError::Collinear {
            min_triangle_area: tri,
        });
    }

    if !is_convex_quad(&quad) {
        return Err(RectifyError::NotConvex);
    }

    let area = polygon_area(&quad);
    let min_area = params.min_quad_area_frac * (src.width * src.height) as f32;
    if area < min_area {
        return Err(RectifyError::QuadTooSmall { area, min_area });
    }

    let canonical = canonical_corners(width, height, params);
    let h_src_from_rect = homography_from_4pt(&canonical, &quad).ok_or(RectifyError::Singular)?;

    let image = warp_perspective(src, &h_src_from_rect, width as usize, height as usize);
    Ok(Rectified {
        image,
        h_src_from_rect,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: usize, h: usize) -> PixelImage {
        let mut data = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
            }
        }
        PixelImage {
            width: w,
            height: h,
            channels: 3,
            data,
        }
    }

    fn corners_from(q: [Point2<f32>; 4]) -> Corners {
        Corners {
            top_left: q[0],
            top_right: q[1],
            bottom_right: q[2],
            bottom_left: q[3],
        }
    }

    #[test]
    fn canonical_corners_are_idempotent() {
        let params = RectifyParams::default();
        let img = gradient(120, 160);
        let corners = corners_from(canonical_corners(120, 160, &params));

        let out = rectify(&img.view(), &corners, 120, 160, &params).expect("rectify");
        assert_eq!((out.image.width, out.image.height), (120, 160));
        assert_eq!(out.image.channels, 3);
        let diff = img
            .data
            .iter()
            .zip(&out.image.data)
            .filter(|(a, b)| (**a as i32 - **b as i32).abs() > 1)
            .count();
        assert_eq!(diff, 0);
    }

    #[test]
    fn output_has_layout_size_for_any_source() {
        let params = RectifyParams::default();
        let img = gradient(400, 300);
        let corners = corners_from([
            Point2::new(30.0, 20.0),
            Point2::new(370.0, 35.0),
            Point2::new(360.0, 280.0),
            Point2::new(25.0, 270.0),
        ]);
        let out = rectify(&img.view(), &corners, 350, 550, &params).expect("rectify");
        assert_eq!((out.image.width, out.image.height), (350, 550));
        assert_eq!(out.image.data.len(), 350 * 550 * 3);

        let back = out.h_src_from_rect.apply(Point2::new(14.0, 14.0));
        assert!((back.x - 30.0).abs() < 1e-2 && (back.y - 20.0).abs() < 1e-2);
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let params = RectifyParams::default();
        let img = gradient(100, 100);
        let corners = corners_from([
            Point2::new(10.0, 10.0),
            Point2::new(50.0, 50.0),
            Point2::new(90.0, 90.0),
            Point2::new(30.0, 30.0),
        ]);
        let err = rectify(&img.view(), &corners, 350, 550, &params).unwrap_err();
        assert!(matches!(err, RectifyError::Collinear { .. }));
    }

    #[test]
    fn concave_corners_are_rejected_before_warping() {
        let params = RectifyParams::default();
        let img = gradient(200, 300);
        let corners = corners_from([
            Point2::new(95.0, 145.0),
            Point2::new(110.0, 10.0),
            Point2::new(190.0, 290.0),
            Point2::new(10.0, 160.0),
        ]);
        let err = rectify(&img.view(), &corners, 350, 550, &params).unwrap_err();
        assert_eq!(err, RectifyError::NotConvex);
    }

    #[test]
    fn tiny_quad_is_rejected() {
        let params = RectifyParams::default();
        let img = gradient(400, 400);
        let corners = corners_from([
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 10.0),
            Point2::new(20.0, 20.0),
            Point2::new(10.0, 20.0),
        ]);
        let err = rectify(&img.view(), &corners, 350, 550, &params).unwrap_err();
        assert!(matches!(err, RectifyError::QuadTooSmall { .. }));
    }
}
