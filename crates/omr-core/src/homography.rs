use crate::{sample_bilinear, PixelImage, PixelImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Planar projective transform acting on homogeneous pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// All nine coefficients are finite.
    pub fn is_finite(&self) -> bool {
        self.h.iter().all(|v| v.is_finite())
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

// Translate to centroid, scale so mean distance = sqrt(2).
fn normalize_points4(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let (mut cx, mut cy) = (0.0_f64, 0.0_f64);
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= 4.0;
    cy /= 4.0;

    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / 4.0;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

/// Compute H such that `dst ~ H * src` from exactly four correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when the linear system is singular (collinear or repeated points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    // H = T_dst^{-1} * Hn * T_src
    let h_den = t_dst.try_inverse()? * hn * t_src;
    let s = h_den[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    let h = Homography::new(h_den / s);
    h.is_finite().then_some(h)
}

/// Resample `src` into an `out_w × out_h` image, keeping every channel.
///
/// `h_src_from_dst` maps continuous output coordinates into continuous source
/// coordinates (pixel `i` spans `[i, i + 1)`), so the identity transform
/// reproduces the source exactly. Samples falling outside `src` read as 0.
pub fn warp_perspective(
    src: &PixelImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
) -> PixelImage {
    let ch = src.channels;
    let mut out = vec![0u8; out_w * out_h * ch];

    for y in 0..out_h {
        for x in 0..out_w {
            let p = h_src_from_dst.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
            let (sx, sy) = (p.x - 0.5, p.y - 0.5);
            let base = (y * out_w + x) * ch;
            for c in 0..ch {
                out[base + c] = sample_bilinear(src, sx, sy, c).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    PixelImage {
        width: out_w,
        height: out_h,
        channels: ch,
        data: out,
    }
}

/// Signed-area magnitude of a simple polygon (shoelace formula).
pub fn polygon_area(pts: &[Point2<f32>]) -> f32 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0_f64;
    for (i, p) in pts.iter().enumerate() {
        let q = pts[(i + 1) % pts.len()];
        acc += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    (acc.abs() * 0.5) as f32
}

/// Smallest area among the four triangles of a quad.
///
/// Zero (or near zero) exactly when three of the points are collinear or two
/// coincide, which makes the 4-point homography ill-posed.
pub fn min_triangle_area(quad: &[Point2<f32>; 4]) -> f32 {
    const TRIS: [[usize; 3]; 4] = [[0, 1, 2], [1, 2, 3], [2, 3, 0], [3, 0, 1]];
    TRIS.iter()
        .map(|t| polygon_area(&[quad[t[0]], quad[t[1]], quad[t[2]]]))
        .fold(f32::INFINITY, f32::min)
}

/// Whether the quad, taken in order, turns the same way at every corner.
///
/// A self-intersecting or concave quad still admits a 4-point homography,
/// but that mapping sends part of the target beyond the line at infinity.
pub fn is_convex_quad(quad: &[Point2<f32>; 4]) -> bool {
    let turn = |k: usize| {
        let (a, b, c) = (quad[k], quad[(k + 1) % 4], quad[(k + 2) % 4]);
        let (ux, uy) = (b.x as f64 - a.x as f64, b.y as f64 - a.y as f64);
        let (vx, vy) = (c.x as f64 - b.x as f64, c.y as f64 - b.y as f64);
        ux * vy - uy * vx
    };
    let turns = [turn(0), turn(1), turn(2), turn(3)];
    turns.iter().all(|&t| t > 0.0) || turns.iter().all(|&t| t < 0.0)
}
