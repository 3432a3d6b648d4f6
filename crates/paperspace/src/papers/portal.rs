use paperspace_core::{corners_to_uvs, scale_polygon, Quad};

use crate::draw::{Color, DrawList, Material};
use crate::error::PaperError;
use crate::paper::{Paper, PaperContext, PaperId, PaperKind, RenderContext};

pub const DEFAULT_INNER_SCALE: f32 = 0.9;

/// The window of a portal, `scale` times the sheet around its centroid.
pub fn portal_inner_corners(corners: &Quad, scale: f32) -> Quad {
    scale_polygon(corners, scale)
}

/// Entrance: marks the desk region that shows up inside a [`PortalOut`].
#[derive(Clone, Debug)]
pub struct PortalIn {
    inner_scale: f32,
}

impl PortalIn {
    pub fn new(inner_scale: f32) -> Self {
        Self { inner_scale }
    }
}

impl Default for PortalIn {
    fn default() -> Self {
        Self::new(DEFAULT_INNER_SCALE)
    }
}

impl Paper for PortalIn {
    fn kind(&self) -> PaperKind {
        PaperKind::PortalIn
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError> {
        let Some(corners) = cx.corners() else {
            return Ok(());
        };
        out.quad(cx.project(corners), Material::solid(Color::PORTAL_IN));
        let inner = portal_inner_corners(corners, self.inner_scale);
        out.quad(cx.project(&inner), Material::solid(Color::BLACK));
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PortalLink {
    source: PaperId,
    /// Camera-space window of the linked entrance.
    window: Quad,
}

/// Exit: shows the camera image under the first visible [`PortalIn`].
#[derive(Clone, Debug)]
pub struct PortalOut {
    inner_scale: f32,
    link: Option<PortalLink>,
}

impl PortalOut {
    pub fn new(inner_scale: f32) -> Self {
        Self {
            inner_scale,
            link: None,
        }
    }

    /// The entrance this exit currently shows.
    pub fn linked_to(&self) -> Option<PaperId> {
        self.link.map(|l| l.source)
    }
}

impl Default for PortalOut {
    fn default() -> Self {
        Self::new(DEFAULT_INNER_SCALE)
    }
}

impl Paper for PortalOut {
    fn kind(&self) -> PaperKind {
        PaperKind::PortalOut
    }

    fn update(&mut self, cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        let link = cx
            .frame
            .visible_of_kind(PaperKind::PortalIn)
            .find_map(|p| {
                p.corners.map(|c| PortalLink {
                    source: p.id,
                    window: portal_inner_corners(&c, self.inner_scale),
                })
            });
        if link.map(|l| l.source) != self.linked_to() {
            log::debug!(
                "portal {} linked to {:?}",
                cx.id,
                link.map(|l| l.source.0)
            );
        }
        self.link = link;
        Ok(())
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError> {
        let Some(corners) = cx.corners() else {
            return Ok(());
        };
        out.quad(cx.project(corners), Material::solid(Color::PORTAL_OUT));

        let inner = cx.project(&portal_inner_corners(corners, self.inner_scale));
        match (self.link, cx.frame.camera_size()) {
            (Some(link), Some(size)) => {
                let uvs = corners_to_uvs(&link.window, size);
                out.quad_with_uvs(inner, uvs, Material::CameraFrame);
            }
            _ => {
                out.quad(inner, Material::solid(Color::BLACK));
            }
        }
        Ok(())
    }

    fn hide(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.link = None;
        Ok(())
    }
}
