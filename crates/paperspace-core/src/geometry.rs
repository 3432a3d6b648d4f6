//! Small polygon helpers shared by shapes and papers.
//!
//! All quads use the corner order top-left, top-right, bottom-right,
//! bottom-left.

use nalgebra::{Matrix2, Point2, Vector2};

/// Four corners in TL, TR, BR, BL order.
pub type Quad = [Point2<f32>; 4];

/// Axis-aligned rectangle of `size` whose top-left corner is `origin`.
pub fn rect_corners(size: [f32; 2], origin: Point2<f32>) -> Quad {
    let [w, h] = size;
    [
        origin,
        Point2::new(origin.x + w, origin.y),
        Point2::new(origin.x + w, origin.y + h),
        Point2::new(origin.x, origin.y + h),
    ]
}

/// Rectangle of `size` centred on `center`, rotated by `rotation` radians.
pub fn centered_rect_corners(center: Point2<f32>, size: [f32; 2], rotation: f32) -> Quad {
    let (sin, cos) = rotation.sin_cos();
    let half_w = Vector2::new(cos, sin) * (size[0] / 2.0);
    let half_h = Vector2::new(-sin, cos) * (size[1] / 2.0);
    [
        center - half_w - half_h,
        center + half_w - half_h,
        center + half_w + half_h,
        center - half_w + half_h,
    ]
}

/// Centroid (vertex average) of a polygon. Empty input yields the origin.
pub fn polygon_center(points: &[Point2<f32>]) -> Point2<f32> {
    if points.is_empty() {
        return Point2::origin();
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f32>, p| acc + p.coords);
    Point2::from(sum / points.len() as f32)
}

/// Scale a quad about its centroid.
pub fn scale_polygon(corners: &Quad, scale: f32) -> Quad {
    let center = polygon_center(corners);
    corners.map(|p| center + (p - center) * scale)
}

/// Angle of the top edge (TL → TR) in radians.
pub fn rotation_from_corners(corners: &Quad) -> f32 {
    let top = corners[1] - corners[0];
    top.y.atan2(top.x)
}

/// Normalise pixel-space corners into texture coordinates of an image of `size`.
pub fn corners_to_uvs(corners: &Quad, size: [f32; 2]) -> Quad {
    corners.map(|p| Point2::new(p.x / size[0], p.y / size[1]))
}

#[inline]
pub fn distance(a: Point2<f32>, b: Point2<f32>) -> f32 {
    (b - a).norm()
}

/// Intersection of the segments `a–b` and `c–d`.
///
/// Returns `None` when the segments are (near) parallel or when the
/// intersection of the supporting lines falls outside either segment.
pub fn line_intersection(
    a: Point2<f32>,
    b: Point2<f32>,
    c: Point2<f32>,
    d: Point2<f32>,
) -> Option<Point2<f32>> {
    let ab = (b - a).cast::<f64>();
    let cd = (d - c).cast::<f64>();

    let m = Matrix2::new(ab.x, -cd.x, ab.y, -cd.y);
    let scale = ab.norm() * cd.norm();
    if scale <= f64::EPSILON || m.determinant().abs() <= 1e-9 * scale {
        return None;
    }

    let rhs = (c - a).cast::<f64>();
    let st = m.try_inverse()? * rhs;
    let (s, t) = (st.x, st.y);
    if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&t) {
        return None;
    }

    Some(Point2::from(a.coords.cast::<f64>() + ab * s).cast::<f32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn diagonals_of_square_meet_in_the_middle() {
        let p = line_intersection(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 0.0),
        )
        .expect("intersection");
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn parallel_or_disjoint_segments_do_not_intersect() {
        let parallel = line_intersection(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(10.0, 1.0),
        );
        assert!(parallel.is_none());

        let beyond = line_intersection(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(5.0, 0.0),
            Point2::new(4.0, 1.0),
        );
        assert!(beyond.is_none());
    }

    #[test]
    fn scaling_keeps_centroid() {
        let quad = rect_corners([10.0, 20.0], Point2::new(5.0, 5.0));
        let scaled = scale_polygon(&quad, 0.5);
        let c0 = polygon_center(&quad);
        let c1 = polygon_center(&scaled);
        assert_relative_eq!(c0.x, c1.x, epsilon = 1e-5);
        assert_relative_eq!(c0.y, c1.y, epsilon = 1e-5);
        assert_relative_eq!(distance(scaled[0], scaled[1]), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn centered_rect_follows_rotation() {
        let quad = centered_rect_corners(
            Point2::new(0.0, 0.0),
            [2.0, 2.0],
            std::f32::consts::FRAC_PI_2,
        );
        assert_relative_eq!(
            rotation_from_corners(&quad),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-5
        );
        assert_relative_eq!(quad[0].x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(quad[0].y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn uvs_are_normalised_by_image_size() {
        let quad = rect_corners([320.0, 240.0], Point2::new(0.0, 0.0));
        let uvs = corners_to_uvs(&quad, [640.0, 480.0]);
        assert_relative_eq!(uvs[2].x, 0.5);
        assert_relative_eq!(uvs[2].y, 0.5);
    }
}
