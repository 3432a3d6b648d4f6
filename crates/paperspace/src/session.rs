//! One frame loop iteration, end to end.

use std::path::Path;
use std::time::Instant;

use paperspace_core::CameraFrame;
use paperspace_tracking::{Detection, MarkerDetector, MarkerTracker};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::config::{AppConfig, CalibrationConfig, Collaborators, PaperList};
use crate::draw::DrawList;
use crate::error::{ConfigError, SessionError};
use crate::papers::ButtonHub;
use crate::space::Space;

/// Owns the tracker and the space, and runs frames through them in order:
/// detections, shapes, transitions, paper updates, render.
pub struct Session {
    tracker: MarkerTracker,
    space: Space,
    buttons: ButtonHub,
}

impl Session {
    pub fn new(space: Space) -> Self {
        Self::with_buttons(space, ButtonHub::new())
    }

    /// Keep `buttons` so events can be published to the papers subscribed
    /// while the space was built.
    pub fn with_buttons(space: Space, buttons: ButtonHub) -> Self {
        let mut tracker = MarkerTracker::new();
        tracker.register(space.marker_ids());
        Self {
            tracker,
            space,
            buttons,
        }
    }

    /// Load the app config at `path`, its calibration and paper list.
    ///
    /// Returns the session and the paper records that were skipped.
    pub fn from_config(
        path: impl AsRef<Path>,
        mut collaborators: Collaborators,
    ) -> Result<(Self, Vec<ConfigError>), SessionError> {
        let path = path.as_ref();
        let app = AppConfig::load_json(path).map_err(SessionError::load(path))?;
        let projector = CalibrationConfig::load_json(&app.calibration)
            .and_then(|c| c.build_projector())
            .map_err(SessionError::load(&app.calibration))?;
        let list = PaperList::load_json(&app.papers).map_err(SessionError::load(&app.papers))?;

        let (space, skipped) = list.build_space(projector, &app.shape, &mut collaborators);
        let mut rejected = list.rejected;
        rejected.extend(skipped);
        log::info!(
            "loaded {} papers from {} ({} skipped)",
            space.len(),
            app.papers.display(),
            rejected.len()
        );
        Ok((Self::with_buttons(space, collaborators.buttons), rejected))
    }

    pub fn tracker(&self) -> &MarkerTracker {
        &self.tracker
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut Space {
        &mut self.space
    }

    pub fn buttons_mut(&mut self) -> &mut ButtonHub {
        &mut self.buttons
    }

    /// Run one frame with detections produced elsewhere.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame, detections), fields(n = detections.len()))
    )]
    pub fn step(
        &mut self,
        frame: Option<CameraFrame>,
        detections: &[Detection],
        now: Instant,
    ) -> DrawList {
        self.tracker.process_frame(detections);
        self.space.set_camera_frame(frame);
        self.space.update(&self.tracker, now);
        self.space.render()
    }

    /// Run one frame, detecting markers in `frame` first.
    pub fn step_with_detector(
        &mut self,
        frame: CameraFrame,
        detector: &mut dyn MarkerDetector,
        now: Instant,
    ) -> DrawList {
        let detections = {
            let gray = frame.to_gray();
            detector.detect(&gray.view())
        };
        self.step(Some(frame), &detections, now)
    }

    /// Hide every visible paper. Call once, between frames.
    pub fn shutdown(&mut self) {
        self.space.shutdown();
    }
}
