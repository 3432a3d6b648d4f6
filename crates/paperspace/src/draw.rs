//! Renderer-agnostic output of a frame.
//!
//! Papers never talk to a graphics API. They emit [`DrawCommand`]s that a
//! window/GPU collaborator turns into textured triangles: each command's
//! [`QuadMesh`] already carries projector-space positions and homogeneous
//! texture coordinates.

use std::path::PathBuf;

use paperspace_core::{Quad, QuadMesh};
use serde::Serialize;

use crate::paper::PaperId;

/// Straight (non-premultiplied) RGBA in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const GREY: Color = Color::rgb(0.35, 0.35, 0.35);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const PORTAL_IN: Color = Color::rgb(0.0, 137.0 / 256.0, 236.0 / 256.0);
    pub const PORTAL_OUT: Color = Color::rgb(247.0 / 256.0, 127.0 / 256.0, 80.0 / 256.0);
    /// Overlay drawn on papers whose last callback failed.
    pub const FAULT: Color = Color::rgba(1.0, 0.1, 0.1, 0.8);
}

/// What fills a quad.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    Solid { color: Color },
    /// The current camera frame; UVs are normalised by the frame size.
    CameraFrame,
    /// Frame `frame` of a video file, decoded by the renderer.
    Video { file: PathBuf, frame: u64 },
}

impl Material {
    pub const fn solid(color: Color) -> Self {
        Material::Solid { color }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrawCommand {
    pub paper: PaperId,
    pub mesh: QuadMesh,
    pub material: Material,
}

/// Ordered draw commands; later commands paint over earlier ones.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct DrawList {
    #[serde(skip)]
    owner: Option<PaperId>,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list whose commands are attributed to `paper`.
    pub fn for_paper(paper: PaperId) -> Self {
        Self {
            owner: Some(paper),
            commands: Vec::new(),
        }
    }

    /// Map the whole material onto `corners` (projector space, TL, TR, BR, BL).
    ///
    /// Degenerate quads are dropped; returns whether something was queued.
    pub fn quad(&mut self, corners: Quad, material: Material) -> bool {
        self.push_mesh(QuadMesh::new(corners), material)
    }

    /// Map the material region `uvs` onto `corners`.
    pub fn quad_with_uvs(&mut self, corners: Quad, uvs: Quad, material: Material) -> bool {
        self.push_mesh(QuadMesh::with_uvs(corners, uvs), material)
    }

    fn push_mesh(&mut self, mesh: Option<QuadMesh>, material: Material) -> bool {
        let Some(mesh) = mesh else {
            log::debug!("skipping degenerate quad for {:?}", self.owner);
            return false;
        };
        self.commands.push(DrawCommand {
            paper: self.owner.unwrap_or_default(),
            mesh,
            material,
        });
        true
    }

    pub fn append(&mut self, other: DrawList) {
        self.commands.extend(other.commands);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
