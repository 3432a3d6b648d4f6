//! The paper capability contract and the per-frame context it runs in.

use std::fmt;
use std::time::Instant;

use paperspace_core::{CameraFrame, PerspectiveProjector, Quad};
use paperspace_tracking::Shape;
use serde::{Deserialize, Serialize};

use crate::draw::DrawList;
use crate::error::PaperError;

/// Stable id of a configured paper.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PaperId(pub u32);

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for PaperId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// The closed set of paper behaviours a configuration can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperKind {
    Video,
    PortalIn,
    PortalOut,
    Gamepad,
    Script,
    ShortcutButton,
}

impl PaperKind {
    pub const ALL: [PaperKind; 6] = [
        PaperKind::Video,
        PaperKind::PortalIn,
        PaperKind::PortalOut,
        PaperKind::Gamepad,
        PaperKind::Script,
        PaperKind::ShortcutButton,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaperKind::Video => "video",
            PaperKind::PortalIn => "portal-in",
            PaperKind::PortalOut => "portal-out",
            PaperKind::Gamepad => "gamepad",
            PaperKind::Script => "script",
            PaperKind::ShortcutButton => "shortcut-button",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Markers a record of this kind must list.
    pub fn marker_count(self) -> usize {
        match self {
            PaperKind::ShortcutButton => 1,
            _ => 4,
        }
    }
}

impl fmt::Display for PaperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame-consistent view of one paper, taken after all shapes and
/// visibility transitions of the frame have been applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaperSnapshot {
    pub id: PaperId,
    pub kind: PaperKind,
    pub visible: bool,
    pub present: bool,
    /// Camera-space corners, possibly stale while absent.
    pub corners: Option<Quad>,
}

/// Inputs shared by every paper during one frame.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub now: Instant,
    pub camera_frame: Option<&'a CameraFrame>,
    pub projector: &'a PerspectiveProjector,
    pub papers: &'a [PaperSnapshot],
}

impl<'a> FrameContext<'a> {
    pub fn paper(&self, id: PaperId) -> Option<&'a PaperSnapshot> {
        self.papers.iter().find(|p| p.id == id)
    }

    /// Visible papers of `kind`, in id order.
    pub fn visible_of_kind(&self, kind: PaperKind) -> impl Iterator<Item = &'a PaperSnapshot> {
        self.papers
            .iter()
            .filter(move |p| p.visible && p.kind == kind)
    }

    /// Camera frame size in pixels, if a frame is attached.
    pub fn camera_size(&self) -> Option<[f32; 2]> {
        self.camera_frame.map(CameraFrame::size)
    }
}

/// Context for `show`, `update` and `hide`: the paper may adjust its own shape.
pub struct PaperContext<'a> {
    pub id: PaperId,
    pub shape: &'a mut Shape,
    pub frame: FrameContext<'a>,
}

impl PaperContext<'_> {
    pub fn corners(&self) -> Option<&Quad> {
        self.shape.corners()
    }

    /// Own corners mapped into projector space.
    pub fn projected_corners(&self) -> Option<Quad> {
        self.shape
            .corners()
            .map(|c| self.frame.projector.project_quad(c))
    }
}

/// Context for `render`: read-only.
pub struct RenderContext<'a> {
    pub id: PaperId,
    pub shape: &'a Shape,
    pub frame: FrameContext<'a>,
}

impl RenderContext<'_> {
    pub fn corners(&self) -> Option<&Quad> {
        self.shape.corners()
    }

    pub fn projected_corners(&self) -> Option<Quad> {
        self.shape
            .corners()
            .map(|c| self.frame.projector.project_quad(c))
    }

    pub fn project(&self, quad: &Quad) -> Quad {
        self.frame.projector.project_quad(quad)
    }
}

/// Behaviour of a paper, driven by the [`Space`](crate::Space).
///
/// `show` runs when the shape appears, `update` and `render` every frame
/// while visible, `hide` when the shape disappears or the space shuts down.
/// Errors are caught per paper; they never abort the frame.
pub trait Paper {
    fn kind(&self) -> PaperKind;

    fn show(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        Ok(())
    }

    fn update(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        Ok(())
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError>;

    fn hide(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in PaperKind::ALL {
            assert_eq!(PaperKind::from_name(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
        assert_eq!(PaperKind::from_name("hologram"), None);
    }

    #[test]
    fn only_buttons_use_a_single_marker() {
        assert_eq!(PaperKind::ShortcutButton.marker_count(), 1);
        assert_eq!(PaperKind::PortalOut.marker_count(), 4);
    }
}
