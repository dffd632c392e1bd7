//! Vertex representation stored in sections
//!
//! Only the position is load-bearing for bounds and collision; the other
//! attributes feed the proxy's attribute and color streams.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;

/// One vertex of a procedural mesh section
///
/// `#[repr(C)]` with no padding so the proxy can upload vertex streams with
/// `bytemuck::cast_slice`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in component space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Tangent vector for normal mapping
    pub tangent: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],

    /// Vertex color (RGBA8)
    pub color: [u8; 4],
}

impl Default for MeshVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            tangent: [1.0, 0.0, 0.0],
            tex_coord: [0.0; 2],
            color: [255; 4],
        }
    }
}

impl MeshVertex {
    /// Vertex with the given position and default attributes
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            ..Default::default()
        }
    }

    /// Create a new vertex with all shading attributes
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            ..Default::default()
        }
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }
}

/// Shading attributes uploaded as the second vertex stream
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexAttributes {
    /// Normal vector
    pub normal: [f32; 3],
    /// Tangent vector
    pub tangent: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl From<&MeshVertex> for VertexAttributes {
    fn from(vertex: &MeshVertex) -> Self {
        Self {
            normal: vertex.normal,
            tangent: vertex.tangent,
            tex_coord: vertex.tex_coord,
        }
    }
}
