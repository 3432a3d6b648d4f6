//! Per-marker presence bookkeeping.

use std::collections::HashMap;
use std::fmt;

use paperspace_core::{GrayImageView, Quad};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Dictionary id of a fiducial marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for MarkerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// One marker seen in the current camera frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: MarkerId,
    /// Image-space corners, clockwise from top-left.
    pub corners: Quad,
}

/// The external marker detector.
///
/// Implementations turn a grayscale camera image into the markers visible in
/// it. Detection itself is not part of this crate.
pub trait MarkerDetector {
    fn detect(&mut self, image: &GrayImageView<'_>) -> Vec<Detection>;
}

/// Last known state of a marker.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    /// `None` until the marker is detected for the first time.
    pub corners: Option<Quad>,
    /// Frames since the last detection; `Some(0)` while visible, `None` if never seen.
    pub absent_frames: Option<u32>,
}

impl Marker {
    fn new(id: MarkerId) -> Self {
        Self {
            id,
            corners: None,
            absent_frames: None,
        }
    }

    #[inline]
    pub fn present(&self) -> bool {
        self.absent_frames == Some(0)
    }
}

/// Ages and stores detections. Records are never removed, so shapes can fall
/// back on the last known corners during brief occlusions.
#[derive(Clone, Debug, Default)]
pub struct MarkerTracker {
    markers: HashMap<MarkerId, Marker>,
    frames: u64,
}

impl MarkerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest the detections of one frame.
    ///
    /// Every previously seen marker ages by one frame; detected markers take
    /// the new corners and reset to zero. A marker id reported twice keeps
    /// the last occurrence.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, detections), fields(n = detections.len()))
    )]
    pub fn process_frame(&mut self, detections: &[Detection]) {
        for marker in self.markers.values_mut() {
            if let Some(absent) = marker.absent_frames.as_mut() {
                *absent = absent.saturating_add(1);
            }
        }

        for det in detections {
            let marker = self
                .markers
                .entry(det.id)
                .or_insert_with(|| Marker::new(det.id));
            marker.corners = Some(det.corners);
            marker.absent_frames = Some(0);
        }

        self.frames += 1;
        log::debug!(
            "frame {}: {} detections, {} markers known",
            self.frames,
            detections.len(),
            self.markers.len()
        );
    }

    /// Record for `id`, created (never seen) if unknown.
    pub fn get(&mut self, id: MarkerId) -> &Marker {
        self.markers.entry(id).or_insert_with(|| Marker::new(id))
    }

    /// Ensure a record exists for every id, e.g. for the markers of a configured shape.
    pub fn register<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = MarkerId>,
    {
        for id in ids {
            self.get(id);
        }
    }

    /// Read-only lookup; `None` means the id was never registered or seen.
    #[inline]
    pub fn peek(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    #[inline]
    pub fn is_present(&self, id: MarkerId) -> bool {
        self.peek(id).is_some_and(Marker::present)
    }

    /// Number of frames processed so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperspace_core::{rect_corners, Point2};

    fn det(id: u32, x: f32) -> Detection {
        Detection {
            id: MarkerId(id),
            corners: rect_corners([10.0, 10.0], Point2::new(x, 0.0)),
        }
    }

    #[test]
    fn unknown_marker_is_absent_without_counter() {
        let mut tracker = MarkerTracker::new();
        tracker.process_frame(&[det(1, 0.0)]);
        let m = tracker.get(MarkerId(42));
        assert!(!m.present());
        assert_eq!(m.absent_frames, None);
        assert_eq!(m.corners, None);
        assert!(!tracker.is_present(MarkerId(99)));
    }

    #[test]
    fn absence_counts_frames_since_last_detection() {
        let mut tracker = MarkerTracker::new();
        tracker.process_frame(&[det(7, 0.0)]);
        assert!(tracker.get(MarkerId(7)).present());

        for _ in 0..4 {
            tracker.process_frame(&[]);
        }
        let m = tracker.get(MarkerId(7));
        assert_eq!(m.absent_frames, Some(4));
        assert!(!m.present());
        assert!(m.corners.is_some(), "last corners are kept");
    }

    #[test]
    fn redetection_overwrites_corners_and_resets_counter() {
        let mut tracker = MarkerTracker::new();
        tracker.process_frame(&[det(3, 0.0)]);
        tracker.process_frame(&[]);
        tracker.process_frame(&[det(3, 50.0)]);

        let m = tracker.peek(MarkerId(3)).expect("known");
        assert!(m.present());
        assert_eq!(m.corners.expect("corners")[0], Point2::new(50.0, 0.0));
        assert_eq!(tracker.frames(), 3);
    }

    #[test]
    fn registered_markers_stay_unseen_until_detected() {
        let mut tracker = MarkerTracker::new();
        tracker.register([MarkerId(1), MarkerId(2)]);
        tracker.process_frame(&[]);
        assert_eq!(tracker.len(), 2);
        assert!(tracker.iter().all(|m| m.absent_frames.is_none()));
    }

    #[test]
    fn detections_deserialize_from_json() {
        let json = r#"{"id": 5, "corners": [[0, 0], [1, 0], [1, 1], [0, 1]]}"#;
        let d: Detection = serde_json::from_str(json).expect("json");
        assert_eq!(d.id, MarkerId(5));
        assert_eq!(d.corners[2], Point2::new(1.0, 1.0));
    }
}
