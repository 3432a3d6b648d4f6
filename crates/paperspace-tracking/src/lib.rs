//! Marker presence tracking and shape reconstruction.
//!
//! Per frame the external detector reports a set of [`Detection`]s. The
//! [`MarkerTracker`] ages every known marker and refreshes the detected ones;
//! each [`Shape`] then derives a stabilised pose from the tracker:
//!
//! 1. [`RectShape`]: four corner markers, present with 3 or 4 visible, the
//!    missing corner rebuilt by parallelogram completion.
//! 2. [`SingleShape`]: one marker with an optional frame-count grace period
//!    and a wall-clock "ignore absence" override.
//!
//! Both apply the same hysteresis: moves smaller than
//! [`ShapeParams::min_move_px`] keep the previous corners.

mod marker;
mod params;
mod shape;

pub use marker::{Detection, Marker, MarkerDetector, MarkerId, MarkerTracker};
pub use params::ShapeParams;
pub use shape::{stabilize_corners, Corner, RectShape, Shape, SingleShape};

pub use paperspace_core::Quad;
