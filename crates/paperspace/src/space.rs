//! The per-frame visibility state machine.

use std::fmt;
use std::time::Instant;

use log::{debug, info, warn};
use paperspace_core::{CameraFrame, PerspectiveProjector};
use paperspace_tracking::{MarkerId, MarkerTracker, Shape};
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::draw::{Color, DrawList, Material};
use crate::error::{PaperError, SpaceError};
use crate::paper::{
    FrameContext, Paper, PaperContext, PaperId, PaperKind, PaperSnapshot, RenderContext,
};

/// Which paper callback produced a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Show,
    Update,
    Render,
    Hide,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecyclePhase::Show => "show",
            LifecyclePhase::Update => "update",
            LifecyclePhase::Render => "render",
            LifecyclePhase::Hide => "hide",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaperStatus {
    #[default]
    Ok,
    Faulted {
        phase: LifecyclePhase,
        message: String,
    },
}

impl PaperStatus {
    pub fn is_faulted(&self) -> bool {
        matches!(self, PaperStatus::Faulted { .. })
    }
}

struct PaperEntry {
    id: PaperId,
    shape: Shape,
    paper: Box<dyn Paper>,
    visible: bool,
    status: PaperStatus,
}

impl PaperEntry {
    fn snapshot(&self) -> PaperSnapshot {
        PaperSnapshot {
            id: self.id,
            kind: self.paper.kind(),
            visible: self.visible,
            present: self.shape.present(),
            corners: self.shape.corners().copied(),
        }
    }
}

impl PaperStatus {
    /// Store the outcome of a callback. Successful `show`/`update`/`hide`
    /// clear an earlier fault; a successful render leaves it alone.
    fn settle(
        &mut self,
        id: PaperId,
        kind: PaperKind,
        phase: LifecyclePhase,
        result: Result<(), PaperError>,
    ) {
        match result {
            Ok(()) => {
                if phase != LifecyclePhase::Render && self.is_faulted() {
                    debug!("paper {id} recovered in {phase}");
                    *self = PaperStatus::Ok;
                }
            }
            Err(err) => {
                warn!("paper {id} ({kind}) failed in {phase}: {err}");
                *self = PaperStatus::Faulted {
                    phase,
                    message: err.to_string(),
                };
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Transition {
    Show,
    Hide,
}

/// Owns the papers and drives their lifecycle from shape presence.
///
/// Each frame: every shape updates, then visibility transitions fire
/// (`show`/`hide`), then every visible paper updates. Rendering is a separate
/// call. A failing paper is marked faulted and drawn as a red quad; the
/// other papers are unaffected.
pub struct Space {
    projector: PerspectiveProjector,
    entries: Vec<PaperEntry>,
    camera_frame: Option<CameraFrame>,
    snapshot: Vec<PaperSnapshot>,
    now: Option<Instant>,
}

impl Space {
    pub fn new(projector: PerspectiveProjector) -> Self {
        Self {
            projector,
            entries: Vec::new(),
            camera_frame: None,
            snapshot: Vec::new(),
            now: None,
        }
    }

    /// Register a paper in the hidden state.
    pub fn add_paper(
        &mut self,
        id: PaperId,
        shape: Shape,
        paper: Box<dyn Paper>,
    ) -> Result<(), SpaceError> {
        let at = match self.entries.binary_search_by_key(&id, |e| e.id) {
            Ok(_) => return Err(SpaceError::DuplicatePaper(id)),
            Err(at) => at,
        };
        debug!("add paper {id} ({}) on {shape}", paper.kind());
        self.entries.insert(
            at,
            PaperEntry {
                id,
                shape,
                paper,
                visible: false,
                status: PaperStatus::Ok,
            },
        );
        Ok(())
    }

    pub fn projector(&self) -> &PerspectiveProjector {
        &self.projector
    }

    /// Attach the frame papers see during the next update/render.
    pub fn set_camera_frame(&mut self, frame: Option<CameraFrame>) {
        self.camera_frame = frame;
    }

    pub fn camera_frame(&self) -> Option<&CameraFrame> {
        self.camera_frame.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: PaperId) -> bool {
        self.entry(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = PaperId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn is_visible(&self, id: PaperId) -> bool {
        self.entry(id).is_some_and(|e| e.visible)
    }

    pub fn status(&self, id: PaperId) -> Option<&PaperStatus> {
        self.entry(id).map(|e| &e.status)
    }

    pub fn shape(&self, id: PaperId) -> Option<&Shape> {
        self.entry(id).map(|e| &e.shape)
    }

    pub fn kind(&self, id: PaperId) -> Option<PaperKind> {
        self.entry(id).map(|e| e.paper.kind())
    }

    pub fn visible_ids(&self) -> Vec<PaperId> {
        self.entries
            .iter()
            .filter(|e| e.visible)
            .map(|e| e.id)
            .collect()
    }

    pub fn faulted_ids(&self) -> Vec<PaperId> {
        self.entries
            .iter()
            .filter(|e| e.status.is_faulted())
            .map(|e| e.id)
            .collect()
    }

    pub fn ids_of_kind(&self, kind: PaperKind) -> Vec<PaperId> {
        self.entries
            .iter()
            .filter(|e| e.paper.kind() == kind)
            .map(|e| e.id)
            .collect()
    }

    /// Every marker some shape depends on.
    pub fn marker_ids(&self) -> Vec<MarkerId> {
        let mut ids: Vec<MarkerId> = self
            .entries
            .iter()
            .flat_map(|e| e.shape.marker_ids())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Current state of every paper, in id order.
    pub fn snapshots(&self) -> Vec<PaperSnapshot> {
        self.entries.iter().map(PaperEntry::snapshot).collect()
    }

    /// Advance one frame against `tracker`, which must already hold this
    /// frame's detections.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(papers = self.entries.len()))
    )]
    pub fn update(&mut self, tracker: &MarkerTracker, now: Instant) {
        self.now = Some(now);

        for entry in &mut self.entries {
            entry.shape.update(tracker, now);
        }

        let transitions: Vec<Option<Transition>> = self
            .entries
            .iter_mut()
            .map(|e| match (e.visible, e.shape.present()) {
                (false, true) => {
                    e.visible = true;
                    Some(Transition::Show)
                }
                (true, false) => {
                    e.visible = false;
                    Some(Transition::Hide)
                }
                _ => None,
            })
            .collect();

        let Space {
            projector,
            entries,
            camera_frame,
            snapshot,
            ..
        } = self;
        *snapshot = entries.iter().map(PaperEntry::snapshot).collect();
        let frame = FrameContext {
            now,
            camera_frame: camera_frame.as_ref(),
            projector: &*projector,
            papers: snapshot.as_slice(),
        };

        for (entry, transition) in entries.iter_mut().zip(transitions) {
            let Some(transition) = transition else {
                continue;
            };
            let kind = entry.paper.kind();
            let mut cx = PaperContext {
                id: entry.id,
                shape: &mut entry.shape,
                frame,
            };
            let (phase, result) = match transition {
                Transition::Show => {
                    info!("show paper {} ({kind})", entry.id);
                    (LifecyclePhase::Show, entry.paper.show(&mut cx))
                }
                Transition::Hide => {
                    info!("hide paper {} ({kind})", entry.id);
                    (LifecyclePhase::Hide, entry.paper.hide(&mut cx))
                }
            };
            entry.status.settle(entry.id, kind, phase, result);
        }

        for entry in entries.iter_mut().filter(|e| e.visible) {
            let kind = entry.paper.kind();
            let mut cx = PaperContext {
                id: entry.id,
                shape: &mut entry.shape,
                frame,
            };
            let result = entry.paper.update(&mut cx);
            entry.status.settle(entry.id, kind, LifecyclePhase::Update, result);
        }
    }

    /// Draw every visible paper, in id order.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn render(&mut self) -> DrawList {
        let now = self.now.unwrap_or_else(Instant::now);
        let Space {
            projector,
            entries,
            camera_frame,
            snapshot,
            ..
        } = self;
        *snapshot = entries.iter().map(PaperEntry::snapshot).collect();
        let frame = FrameContext {
            now,
            camera_frame: camera_frame.as_ref(),
            projector: &*projector,
            papers: snapshot.as_slice(),
        };

        let mut out = DrawList::new();
        for entry in entries.iter_mut().filter(|e| e.visible) {
            let cx = RenderContext {
                id: entry.id,
                shape: &entry.shape,
                frame,
            };
            if !entry.status.is_faulted() {
                let mut scratch = DrawList::for_paper(entry.id);
                match entry.paper.render(&cx, &mut scratch) {
                    Ok(()) => {
                        out.append(scratch);
                        continue;
                    }
                    Err(err) => {
                        let kind = entry.paper.kind();
                        entry
                            .status
                            .settle(entry.id, kind, LifecyclePhase::Render, Err(err));
                    }
                }
            }
            draw_fault(&cx, &mut out);
        }
        out
    }

    /// Hide every visible paper. Call between frames when the loop stops.
    pub fn shutdown(&mut self) {
        let now = self.now.unwrap_or_else(Instant::now);
        let Space {
            projector,
            entries,
            camera_frame,
            snapshot,
            ..
        } = self;
        let was_visible: Vec<bool> = entries
            .iter_mut()
            .map(|e| std::mem::replace(&mut e.visible, false))
            .collect();
        *snapshot = entries.iter().map(PaperEntry::snapshot).collect();
        let frame = FrameContext {
            now,
            camera_frame: camera_frame.as_ref(),
            projector: &*projector,
            papers: snapshot.as_slice(),
        };

        for (entry, _) in entries
            .iter_mut()
            .zip(was_visible)
            .filter(|(_, visible)| *visible)
        {
            let kind = entry.paper.kind();
            info!("hide paper {} ({kind}) on shutdown", entry.id);
            let mut cx = PaperContext {
                id: entry.id,
                shape: &mut entry.shape,
                frame,
            };
            let result = entry.paper.hide(&mut cx);
            entry.status.settle(entry.id, kind, LifecyclePhase::Hide, result);
        }
    }

    fn entry(&self, id: PaperId) -> Option<&PaperEntry> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entries[i])
    }
}

fn draw_fault(cx: &RenderContext<'_>, out: &mut DrawList) {
    if let Some(corners) = cx.projected_corners() {
        let mut fault = DrawList::for_paper(cx.id);
        fault.quad(corners, Material::solid(Color::FAULT));
        out.append(fault);
    }
}
