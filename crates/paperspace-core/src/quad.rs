//! Perspective-correct texture mapping onto arbitrary convex quads.
//!
//! A quad drawn as two triangles with plain `(u, v)` coordinates shows a
//! visible crease along the shared diagonal whenever the quad is not a
//! parallelogram, because each triangle interpolates affinely. Instead each
//! vertex carries a homogeneous `(u*q, v*q, q)` coordinate, and the fragment
//! stage divides by the interpolated `q`.
//!
//! The weights come from the diagonal intersection `p`: with `d_i = |c_i - p|`
//! and `o = (i + 2) % 4` the opposite corner,
//!
//! ```text
//! q_i = (d_i + d_o) / d_o
//! ```
//!
//! Homogeneous coordinates are scale invariant, so the weights are halved to
//! make any parallelogram (and in particular an axis-aligned rectangle) map to
//! exactly `q_i = 1`, i.e. ordinary affine UVs.

use nalgebra::Point2;
use serde::Serialize;

use crate::geometry::{line_intersection, Quad};

/// Texture coordinates covering the whole texture, in TL, TR, BR, BL order.
pub const UNIT_UVS: Quad = [
    Point2::new(0.0, 0.0),
    Point2::new(1.0, 0.0),
    Point2::new(1.0, 1.0),
    Point2::new(0.0, 1.0),
];

const MIN_DIAGONAL_PART: f32 = 1e-6;

/// Smallest sine of the angle between the diagonals of a drawable quad.
const MIN_DIAGONAL_SINE: f32 = 1e-3;

/// Per-corner homogeneous weights `q_i` for a quad in consistent winding.
///
/// Returns `None` for degenerate quads: (near) parallel diagonals, diagonals
/// that do not cross inside both segments, or an intersection touching a
/// corner.
pub fn projective_weights(corners: &Quad) -> Option<[f32; 4]> {
    let a = corners[2] - corners[0];
    let b = corners[1] - corners[3];
    let lengths = a.norm() * b.norm();
    if lengths <= f32::EPSILON || (a.perp(&b) / lengths).abs() < MIN_DIAGONAL_SINE {
        return None;
    }

    let center = line_intersection(corners[0], corners[2], corners[3], corners[1])?;
    let d = corners.map(|c| (c - center).norm());
    if d.iter().any(|&di| di < MIN_DIAGONAL_PART) {
        return None;
    }
    Some(std::array::from_fn(|i| {
        let opposite = d[(i + 2) % 4];
        0.5 * (d[i] + opposite) / opposite
    }))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct QuadVertex {
    pub position: [f32; 2],
    /// `(u*q, v*q, q)`.
    pub uvq: [f32; 3],
}

impl QuadVertex {
    /// Texture coordinate after the per-fragment divide, evaluated at the vertex.
    pub fn uv(&self) -> [f32; 2] {
        [self.uvq[0] / self.uvq[2], self.uvq[1] / self.uvq[2]]
    }
}

/// Vertex data for one textured quad, ready for a rasterizer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct QuadMesh {
    pub vertices: [QuadVertex; 4],
}

impl QuadMesh {
    /// Two triangles sharing the `0–2` diagonal.
    pub const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

    /// Map the full texture onto `corners`.
    pub fn new(corners: Quad) -> Option<Self> {
        Self::with_uvs(corners, UNIT_UVS)
    }

    /// Map the texture region `uvs` onto `corners`; both in TL, TR, BR, BL order.
    ///
    /// `None` means "do not draw": the quad has no usable area.
    pub fn with_uvs(corners: Quad, uvs: Quad) -> Option<Self> {
        let q = projective_weights(&corners)?;
        let vertices = std::array::from_fn(|i| QuadVertex {
            position: [corners[i].x, corners[i].y],
            uvq: [uvs[i].x * q[i], uvs[i].y * q[i], q[i]],
        });
        Some(Self { vertices })
    }

    pub fn corners(&self) -> Quad {
        self.vertices
            .map(|v| Point2::new(v.position[0], v.position[1]))
    }

    pub fn weights(&self) -> [f32; 4] {
        self.vertices.map(|v| v.uvq[2])
    }
}
