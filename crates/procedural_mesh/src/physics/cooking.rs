//! Collision cooking
//!
//! Turns a [`BodySetup`] into [`CookedCollision`] data. The cooker is pure:
//! it reads the setup and returns a result, so it can run on any thread.

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::scene::AABB;
use super::body_setup::{BodySetup, GeometryId};
use super::collision::MIN_HULL_POINTS;

/// Errors produced while cooking collision data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookError {
    /// A triangle referenced a vertex outside the mesh
    #[error("Triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidTriangleIndex {
        /// Triangle number
        triangle: usize,
        /// Offending vertex index
        index: u32,
        /// Vertices available
        vertex_count: usize,
    },

    /// Triangle provenance does not line up with the triangle list
    #[error("Triangle mesh has {triangles} triangles but {material_indices} material indices")]
    MaterialIndexMismatch {
        /// Triangle count
        triangles: usize,
        /// Material index count
        material_indices: usize,
    },

    /// A convex element has too few points to form a volume
    #[error("Convex element {0} has fewer than 4 points")]
    DegenerateHull(usize),

    /// The cook worker went away before finishing
    #[error("Cook worker disconnected")]
    WorkerDisconnected,
}

/// Cooked triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct CookedTriMesh {
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Triangles in cooked winding order
    pub triangles: Vec<[u32; 3]>,
    /// Source section per cooked triangle
    pub material_indices: Vec<u32>,
    /// Bounds of the cooked triangles
    pub bounds: AABB,
}

/// Cooked convex hull
#[derive(Debug, Clone, PartialEq)]
pub struct CookedConvex {
    /// Hull points
    pub vertices: Vec<Vec3>,
    /// Hull bounds
    pub bounds: AABB,
}

/// Output of a successful cook
#[derive(Debug, Clone, PartialEq)]
pub struct CookedCollision {
    /// Id of the setup this was cooked from
    pub geometry_id: GeometryId,
    /// Complex collision
    pub tri_mesh: Option<CookedTriMesh>,
    /// Simple collision
    pub convex: Vec<CookedConvex>,
}

impl CookedCollision {
    /// Union of all cooked shape bounds
    pub fn bounds(&self) -> AABB {
        let mut bounds = AABB::empty();
        if let Some(tri_mesh) = &self.tri_mesh {
            bounds.encapsulate(&tri_mesh.bounds);
        }
        for convex in &self.convex {
            bounds.encapsulate(&convex.bounds);
        }
        bounds
    }

    /// Number of cooked triangles
    pub fn num_triangles(&self) -> usize {
        self.tri_mesh.as_ref().map_or(0, |mesh| mesh.triangles.len())
    }
}

/// Something that can cook a body setup
pub trait CollisionCooker: Send + Sync {
    /// Cook the setup's geometry
    fn cook(&self, setup: &BodySetup) -> Result<CookedCollision, CookError>;
}

/// Default in-process cooker
///
/// Validates triangle indices, drops triangles that reuse a vertex, and
/// reverses winding when the mesh asks for flipped normals.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshCooker;

impl MeshCooker {
    /// Create a cooker
    pub fn new() -> Self {
        Self
    }
}

impl CollisionCooker for MeshCooker {
    fn cook(&self, setup: &BodySetup) -> Result<CookedCollision, CookError> {
        let tri_mesh = match &setup.tri_mesh {
            Some(data) if !data.is_empty() => {
                if data.material_indices.len() != data.indices.len() {
                    return Err(CookError::MaterialIndexMismatch {
                        triangles: data.indices.len(),
                        material_indices: data.material_indices.len(),
                    });
                }

                let vertex_count = data.vertices.len();
                let mut triangles = Vec::with_capacity(data.indices.len());
                let mut material_indices = Vec::with_capacity(data.indices.len());
                let mut bounds = AABB::empty();

                for (triangle, (tri, &material)) in data.indices.iter().zip(&data.material_indices).enumerate() {
                    if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                        return Err(CookError::InvalidTriangleIndex { triangle, index, vertex_count });
                    }
                    if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                        continue;
                    }

                    let cooked = if data.flip_normals {
                        [tri[0], tri[2], tri[1]]
                    } else {
                        *tri
                    };
                    for &i in &cooked {
                        bounds.encapsulate_point(data.vertices[i as usize]);
                    }
                    triangles.push(cooked);
                    material_indices.push(material);
                }

                let dropped = data.indices.len() - triangles.len();
                if dropped > 0 {
                    log::debug!("Cooking dropped {} degenerate triangles", dropped);
                }

                Some(CookedTriMesh {
                    vertices: data.vertices.clone(),
                    triangles,
                    material_indices,
                    bounds,
                })
            }
            _ => None,
        };

        let convex = setup
            .agg_geom
            .convex_elems
            .iter()
            .enumerate()
            .map(|(i, elem)| {
                if elem.vertices().len() < MIN_HULL_POINTS {
                    return Err(CookError::DegenerateHull(i));
                }
                Ok(CookedConvex {
                    vertices: elem.vertices().to_vec(),
                    bounds: *elem.elem_box(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CookedCollision {
            geometry_id: setup.geometry_id,
            tri_mesh,
            convex,
        })
    }
}
