//! Fixed camera-space → projector-space mapping.

use nalgebra::Point2;

use crate::geometry::Quad;
use crate::homography::{homography_from_4pt, Homography};

/// Which side of the calibration a degenerate point set came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationSide {
    Camera,
    Projector,
}

impl std::fmt::Display for CalibrationSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationSide::Camera => f.write_str("camera"),
            CalibrationSide::Projector => f.write_str("projector"),
        }
    }
}

/// Setup-time failures while building a [`PerspectiveProjector`].
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProjectorError {
    #[error("{side} calibration points contain a non-finite coordinate")]
    NonFinite { side: CalibrationSide },
    #[error("{side} calibration points {indices:?} are collinear")]
    Collinear {
        side: CalibrationSide,
        indices: [usize; 3],
    },
    #[error("calibration homography is singular")]
    Singular,
}

/// Relative area below which three calibration points count as collinear.
const COLLINEAR_REL_AREA: f32 = 1e-6;

/// Immutable homography from camera pixels to projector pixels.
///
/// Built once from four correspondences; never re-estimated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveProjector {
    homography: Homography,
}

impl PerspectiveProjector {
    /// Build from four camera-space points and their projector-space images.
    pub fn from_correspondences(camera: &Quad, projector: &Quad) -> Result<Self, ProjectorError> {
        check_points(camera, CalibrationSide::Camera)?;
        check_points(projector, CalibrationSide::Projector)?;
        let homography =
            homography_from_4pt(camera, projector).ok_or(ProjectorError::Singular)?;
        log::debug!("camera→projector homography: {:?}", homography.to_array());
        Ok(Self { homography })
    }

    /// Wrap an already-estimated homography.
    pub fn from_homography(homography: Homography) -> Self {
        Self { homography }
    }

    pub fn identity() -> Self {
        Self::from_homography(Homography::identity())
    }

    #[inline]
    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    #[inline]
    pub fn project_point(&self, p: Point2<f32>) -> Point2<f32> {
        self.homography.apply(p)
    }

    /// Map a sequence of camera-space points, preserving order.
    pub fn project(&self, points: &[Point2<f32>]) -> Vec<Point2<f32>> {
        points.iter().map(|&p| self.homography.apply(p)).collect()
    }

    #[inline]
    pub fn project_quad(&self, quad: &Quad) -> Quad {
        self.homography.apply_quad(quad)
    }
}

fn check_points(points: &Quad, side: CalibrationSide) -> Result<(), ProjectorError> {
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(ProjectorError::NonFinite { side });
    }

    let diameter_sq = points
        .iter()
        .flat_map(|a| points.iter().map(move |b| (b - a).norm_squared()))
        .fold(0.0_f32, f32::max);

    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    for indices in TRIPLES {
        let [a, b, c] = indices.map(|i| points[i]);
        let ab = b - a;
        let ac = c - a;
        let area2 = (ab.x * ac.y - ab.y * ac.x).abs();
        if area2 <= COLLINEAR_REL_AREA * diameter_sq {
            return Err(ProjectorError::Collinear { side, indices });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect_corners;
    use approx::assert_relative_eq;

    fn camera_quad() -> Quad {
        [
            Point2::new(102.0, 88.0),
            Point2::new(1180.0, 64.0),
            Point2::new(1215.0, 690.0),
            Point2::new(80.0, 702.0),
        ]
    }

    #[test]
    fn calibration_corners_land_on_projector_rect() {
        let target = rect_corners([1920.0, 1080.0], Point2::origin());
        let projector =
            PerspectiveProjector::from_correspondences(&camera_quad(), &target).expect("projector");

        let mapped = projector.project(&camera_quad());
        for (p, t) in mapped.iter().zip(target.iter()) {
            assert_relative_eq!(p.x, t.x, epsilon = 1e-2);
            assert_relative_eq!(p.y, t.y, epsilon = 1e-2);
        }
    }

    #[test]
    fn project_quad_matches_point_wise_projection() {
        let target = rect_corners([1280.0, 720.0], Point2::origin());
        let projector =
            PerspectiveProjector::from_correspondences(&camera_quad(), &target).expect("projector");
        let quad = rect_corners([50.0, 30.0], Point2::new(400.0, 300.0));
        let a = projector.project_quad(&quad);
        let b = projector.project(&quad);
        assert_eq!(a.to_vec(), b);
    }

    #[test]
    fn collinear_calibration_is_rejected() {
        let target = rect_corners([1280.0, 720.0], Point2::origin());
        let camera = [
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(200.0, 0.0),
            Point2::new(0.0, 100.0),
        ];
        let err = PerspectiveProjector::from_correspondences(&camera, &target).unwrap_err();
        assert_eq!(
            err,
            ProjectorError::Collinear {
                side: CalibrationSide::Camera,
                indices: [0, 1, 2]
            }
        );
    }

    #[test]
    fn non_finite_projector_points_are_rejected() {
        let mut target = rect_corners([1280.0, 720.0], Point2::origin());
        target[3].x = f32::NAN;
        let err = PerspectiveProjector::from_correspondences(&camera_quad(), &target).unwrap_err();
        assert_eq!(
            err,
            ProjectorError::NonFinite {
                side: CalibrationSide::Projector
            }
        );
    }

    #[test]
    fn identity_leaves_points_alone() {
        let p = Point2::new(12.5, -3.0);
        assert_eq!(PerspectiveProjector::identity().project_point(p), p);
    }
}
