//! Raycast against line segments.
//!
//! A library utility for interactive papers (e.g. a ray bounced off sheet
//! edges), not used by the built-in kinds: a single ray tested against a
//! flat list of segments, closest hit wins.

use nalgebra::{Point2, Vector2};

use crate::geometry::line_intersection;

/// A segment that rays can hit, tagged with caller data.
#[derive(Clone, Debug, PartialEq)]
pub struct LineCollider<T> {
    pub start: Point2<f32>,
    pub end: Point2<f32>,
    pub tag: T,
}

impl<T> LineCollider<T> {
    pub fn new(start: Point2<f32>, end: Point2<f32>, tag: T) -> Self {
        Self { start, end, tag }
    }
}

/// Closest intersection found by [`raycast`].
#[derive(Clone, Copy, Debug)]
pub struct RayHit<'a, T> {
    pub point: Point2<f32>,
    /// Euclidean distance from the ray origin.
    pub distance: f32,
    pub collider: &'a LineCollider<T>,
}

/// Cast a ray of finite `length` from `origin` along `direction`.
///
/// `direction` does not need to be normalised; a zero direction never hits.
pub fn raycast<'a, T>(
    origin: Point2<f32>,
    direction: Vector2<f32>,
    length: f32,
    colliders: &'a [LineCollider<T>],
) -> Option<RayHit<'a, T>> {
    let dir = direction.try_normalize(f32::EPSILON)?;
    let end = origin + dir * length;

    let mut best: Option<RayHit<'a, T>> = None;
    for collider in colliders {
        let Some(point) = line_intersection(origin, end, collider.start, collider.end) else {
            continue;
        };
        let distance = (point - origin).norm();
        if best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(RayHit {
                point,
                distance,
                collider,
            });
        }
    }
    best
}
