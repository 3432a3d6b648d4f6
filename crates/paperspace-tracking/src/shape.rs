//! Stabilised geometry derived from one or more markers.

use std::fmt;
use std::time::{Duration, Instant};

use nalgebra::Point2;
use paperspace_core::Quad;

use crate::marker::{MarkerId, MarkerTracker};
use crate::params::ShapeParams;

/// Corner roles of a [`RectShape`], in configuration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The diagonally opposite role.
    #[inline]
    pub fn opposite(self) -> Corner {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// The two roles sharing an edge with this one.
    #[inline]
    pub fn adjacent(self) -> [Corner; 2] {
        [
            Self::ALL[(self.index() + 1) % 4],
            Self::ALL[(self.index() + 3) % 4],
        ]
    }
}

/// Hysteresis: keep `previous` unless some coordinate of `candidate` moved by
/// at least `min_move_px`. No blending; a large move is adopted wholesale.
pub fn stabilize_corners(candidate: Quad, previous: Option<&Quad>, params: &ShapeParams) -> Quad {
    let Some(previous) = previous.filter(|_| params.smooth) else {
        return candidate;
    };

    let max_delta = candidate
        .iter()
        .zip(previous.iter())
        .flat_map(|(a, b)| [(a.x - b.x).abs(), (a.y - b.y).abs()])
        .fold(0.0_f32, f32::max);

    if max_delta < params.min_move_px {
        *previous
    } else {
        candidate
    }
}

/// Fill in at most one missing corner of a rigid rectangle.
///
/// `missing = opposite + (adjacent_a - opposite) + (adjacent_b - opposite)`.
fn complete_parallelogram(points: [Option<Point2<f32>>; 4]) -> Option<Quad> {
    let missing: Vec<Corner> = Corner::ALL
        .into_iter()
        .filter(|c| points[c.index()].is_none())
        .collect();

    match missing.as_slice() {
        [] => Some(points.map(|p| p.unwrap_or_else(Point2::origin))),
        [role] => {
            let opposite = points[role.opposite().index()]?;
            let [a, b] = role.adjacent().map(|c| points[c.index()]);
            let (a, b) = (a?, b?);
            let mut quad = points.map(|p| p.unwrap_or_else(Point2::origin));
            quad[role.index()] = opposite + (a - opposite) + (b - opposite);
            Some(quad)
        }
        _ => None,
    }
}

/// A sheet with one marker near each corner.
#[derive(Clone, Debug)]
pub struct RectShape {
    markers: [MarkerId; 4],
    params: ShapeParams,
    corners: Option<Quad>,
    present: bool,
}

impl RectShape {
    /// `markers` in TL, TR, BR, BL order.
    pub fn new(markers: [MarkerId; 4], params: ShapeParams) -> Self {
        Self {
            markers,
            params,
            corners: None,
            present: false,
        }
    }

    #[inline]
    pub fn markers(&self) -> &[MarkerId; 4] {
        &self.markers
    }

    #[inline]
    pub fn present(&self) -> bool {
        self.present
    }

    /// Last stabilised corners; kept (stale) while the shape is absent.
    #[inline]
    pub fn corners(&self) -> Option<&Quad> {
        self.corners.as_ref()
    }

    pub fn markers_present(&self, tracker: &MarkerTracker) -> usize {
        self.markers
            .iter()
            .filter(|&&id| tracker.is_present(id))
            .count()
    }

    /// Recompute presence and corners from this frame's tracker state.
    ///
    /// Each role contributes the first corner of its marker. With 3 of 4
    /// markers visible the fourth is reconstructed; with fewer the shape is
    /// absent and the previous corners are left untouched.
    pub fn update(&mut self, tracker: &MarkerTracker) {
        let anchors = self.markers.map(|id| {
            tracker
                .peek(id)
                .filter(|m| m.present())
                .and_then(|m| m.corners)
                .map(|c| c[0])
        });

        match complete_parallelogram(anchors) {
            Some(candidate) => {
                self.corners = Some(stabilize_corners(
                    candidate,
                    self.corners.as_ref(),
                    &self.params,
                ));
                self.present = true;
            }
            None => self.present = false,
        }
    }
}

/// A small item tracked by a single marker, e.g. a button.
#[derive(Clone, Debug)]
pub struct SingleShape {
    marker: MarkerId,
    absent_after: Option<u32>,
    ignore_absence_until: Option<Instant>,
    params: ShapeParams,
    corners: Option<Quad>,
    present: bool,
}

impl SingleShape {
    /// `absent_after`: frames of absence tolerated before the shape is absent.
    /// `None` follows the marker exactly.
    pub fn new(marker: MarkerId, absent_after: Option<u32>, params: ShapeParams) -> Self {
        Self {
            marker,
            absent_after,
            ignore_absence_until: None,
            params,
            corners: None,
            present: false,
        }
    }

    #[inline]
    pub fn marker(&self) -> MarkerId {
        self.marker
    }

    #[inline]
    pub fn absent_after(&self) -> Option<u32> {
        self.absent_after
    }

    #[inline]
    pub fn present(&self) -> bool {
        self.present
    }

    /// The marker's own quad (stabilised).
    #[inline]
    pub fn corners(&self) -> Option<&Quad> {
        self.corners.as_ref()
    }

    #[inline]
    pub fn ignore_absence_until(&self) -> Option<Instant> {
        self.ignore_absence_until
    }

    /// Force the shape present until `now + duration`, whatever the marker does.
    pub fn ignore_absence(&mut self, now: Instant, duration: Duration) {
        self.ignore_absence_until = Some(now + duration);
        self.present = true;
    }

    pub fn update(&mut self, tracker: &MarkerTracker, now: Instant) {
        let marker = tracker.peek(self.marker);

        self.present = match (self.absent_after, marker.and_then(|m| m.absent_frames)) {
            (Some(limit), Some(absent)) => absent < limit,
            _ => marker.is_some_and(|m| m.present()),
        };

        if self.present {
            if let Some(candidate) = marker.and_then(|m| m.corners) {
                self.corners = Some(stabilize_corners(
                    candidate,
                    self.corners.as_ref(),
                    &self.params,
                ));
            }
        }

        if let Some(until) = self.ignore_absence_until {
            if now < until {
                self.present = true;
            } else {
                self.ignore_absence_until = None;
            }
        }
    }
}

/// Any shape a paper can be bound to.
#[derive(Clone, Debug)]
pub enum Shape {
    Rect(RectShape),
    Single(SingleShape),
}

impl Shape {
    pub fn rect(markers: [MarkerId; 4], params: ShapeParams) -> Self {
        Shape::Rect(RectShape::new(markers, params))
    }

    pub fn single(marker: MarkerId, absent_after: Option<u32>, params: ShapeParams) -> Self {
        Shape::Single(SingleShape::new(marker, absent_after, params))
    }

    pub fn update(&mut self, tracker: &MarkerTracker, now: Instant) {
        match self {
            Shape::Rect(s) => s.update(tracker),
            Shape::Single(s) => s.update(tracker, now),
        }
    }

    #[inline]
    pub fn present(&self) -> bool {
        match self {
            Shape::Rect(s) => s.present(),
            Shape::Single(s) => s.present(),
        }
    }

    #[inline]
    pub fn corners(&self) -> Option<&Quad> {
        match self {
            Shape::Rect(s) => s.corners(),
            Shape::Single(s) => s.corners(),
        }
    }

    pub fn marker_ids(&self) -> Vec<MarkerId> {
        match self {
            Shape::Rect(s) => s.markers().to_vec(),
            Shape::Single(s) => vec![s.marker()],
        }
    }

    /// Keep the shape present for `duration`. Only single-marker shapes
    /// support the override; returns whether it was applied.
    pub fn ignore_absence(&mut self, now: Instant, duration: Duration) -> bool {
        match self {
            Shape::Rect(_) => false,
            Shape::Single(s) => {
                s.ignore_absence(now, duration);
                true
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Rect(s) => {
                let [a, b, c, d] = s.markers();
                write!(f, "RectShape({a},{b},{c},{d})")
            }
            Shape::Single(s) => write!(f, "SingleShape({})", s.marker()),
        }
    }
}
