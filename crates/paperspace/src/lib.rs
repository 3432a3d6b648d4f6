//! Projected paper overlays driven by fiducial markers.
//!
//! This crate ties the workspace together:
//! - [`Paper`]: the `show`/`update`/`render`/`hide` capability contract,
//! - [`Space`]: the per-frame visibility state machine with per-paper fault
//!   isolation,
//! - [`papers`]: built-in kinds (video, portals, gamepad, script, remote button),
//! - [`config`]: JSON paper records, calibration and app files,
//! - [`Session`]: one frame loop iteration from detections to a [`DrawList`].
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::time::Instant;
//! use paperspace::{Collaborators, Session};
//! use paperspace::tracking::Detection;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut session, skipped) =
//!     Session::from_config("paperspace.json", Collaborators::default())?;
//! println!("skipped {} paper records", skipped.len());
//!
//! let detections: Vec<Detection> = Vec::new();
//! let draws = session.step(None, &detections, Instant::now());
//! println!("{} draw commands", draws.len());
//! session.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `paperspace::core`: homography, projector, quad mapping, geometry helpers.
//! - `paperspace::tracking`: marker tracker and shapes.

pub use paperspace_core as core;
pub use paperspace_tracking as tracking;

pub mod config;
mod draw;
mod error;
mod paper;
pub mod papers;
mod session;
mod space;

pub use config::{
    AppConfig, CalibrationConfig, Collaborators, PaperKindConfig, PaperList, PaperRecord,
};
pub use draw::{Color, DrawCommand, DrawList, Material};
pub use error::{ConfigError, PaperError, SessionError, SpaceError};
pub use paper::{
    FrameContext, Paper, PaperContext, PaperId, PaperKind, PaperSnapshot, RenderContext,
};
pub use session::Session;
pub use space::{LifecyclePhase, PaperStatus, Space};
