//! Geometry core for projected paper overlays.
//!
//! This crate is purely geometric and has no notion of papers, markers or
//! frame loops. It provides:
//! - [`Homography`] and the 4-point solve used for calibration,
//! - [`PerspectiveProjector`], the fixed camera → projector mapping,
//! - [`QuadMesh`], perspective-correct texture mapping onto arbitrary quads,
//! - small polygon helpers and a line-segment raycast,
//! - camera frame containers handed to the tracking layer.

mod geometry;
mod homography;
mod image;
mod logger;
mod projector;
mod quad;
mod raycast;

pub use geometry::{
    centered_rect_corners, corners_to_uvs, distance, line_intersection, polygon_center,
    rect_corners, rotation_from_corners, scale_polygon, Quad,
};
pub use homography::{homography_from_4pt, Homography};
pub use image::{CameraFrame, FrameError, GrayImage, GrayImageView, PixelFormat};
pub use projector::{CalibrationSide, PerspectiveProjector, ProjectorError};
pub use quad::{projective_weights, QuadMesh, QuadVertex, UNIT_UVS};
pub use raycast::{raycast, LineCollider, RayHit};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

pub use nalgebra::Point2;
