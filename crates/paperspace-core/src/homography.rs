//! Planar homographies between quads.
//!
//! Four-point solves go through the unit square: for a quad `q` there is a
//! closed-form `S_q` mapping `(0,0) (1,0) (1,1) (0,1)` onto its TL, TR, BR,
//! BL corners, and `src → dst` is `S_dst · S_src⁻¹`.

use nalgebra::{Matrix3, Point2, Vector3};

use crate::geometry::Quad;

/// Planar projective transform `p' ~ H * p`, normalised so that `h[(2, 2)] == 1`.
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

    /// Row-major entries, for logs and calibration dumps.
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        std::array::from_fn(|r| std::array::from_fn(|c| self.h[(r, c)]))
    }

    /// Homogeneous image of `p` before the perspective divide.
    #[inline]
    pub fn apply_homogeneous(&self, p: Point2<f32>) -> Vector3<f64> {
        self.h * Vector3::new(f64::from(p.x), f64::from(p.y), 1.0)
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.apply_homogeneous(p);
        Point2::new((v.x / v.z) as f32, (v.y / v.z) as f32)
    }

    /// Map four corners at once, preserving their order.
    #[inline]
    pub fn apply_quad(&self, quad: &Quad) -> Quad {
        quad.map(|p| self.apply(p))
    }

    /// `self` after `first`: maps `p` to `self(first(p))`.
    pub fn after(&self, first: &Homography) -> Option<Self> {
        normalized(self.h * first.h).map(Self::new)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().and_then(normalized).map(Self::new)
    }
}

fn normalized(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    let scale = h.abs().max();
    if !s.is_finite() || s.abs() <= 1e-12 * scale.max(1.0) {
        return None;
    }
    Some(h / s)
}

/// Closed-form map from the unit square onto `quad`.
///
/// `None` when two adjacent edges at the BR corner are parallel, which
/// includes collapsed quads.
fn square_to_quad(quad: &Quad) -> Option<Matrix3<f64>> {
    let [p0, p1, p2, p3] = quad.map(|p| p.cast::<f64>());

    let sum = (p0 - p1) + (p2 - p3);
    let d1 = p1 - p2;
    let d2 = p3 - p2;
    let den = d1.x * d2.y - d2.x * d1.y;
    let scale = d1.norm() * d2.norm();
    if scale <= f64::EPSILON || den.abs() <= 1e-9 * scale {
        return None;
    }

    // Projective row; zero for parallelograms.
    let g = (sum.x * d2.y - d2.x * sum.y) / den;
    let h = (d1.x * sum.y - sum.x * d1.y) / den;

    Some(Matrix3::new(
        p1.x - p0.x + g * p1.x,
        p3.x - p0.x + h * p3.x,
        p0.x,
        p1.y - p0.y + g * p1.y,
        p3.y - p0.y + h * p3.y,
        p0.y,
        g,
        h,
        1.0,
    ))
}

/// Compute H such that `dst ~ H * src` from exactly 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when either quad is degenerate.
pub fn homography_from_4pt(src: &Quad, dst: &Quad) -> Option<Homography> {
    let from_square = square_to_quad(src)?.try_inverse()?;
    let to_dst = square_to_quad(dst)?;
    let h = normalized(to_dst * from_square)?;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Homography::new(h))
}
