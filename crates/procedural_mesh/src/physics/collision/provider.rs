//! Collision data provider contract
//!
//! The physics subsystem pulls geometry through this trait when it cooks a
//! body; the mesh component is the only implementor in this crate.

use super::trimesh::{TriMeshCollisionData, TriMeshSizeEstimates};

/// Query triple consumed by the physics subsystem
pub trait CollisionDataProvider {
    /// Size estimate: total vertex count across collision-enabled sections
    fn tri_mesh_size_estimates(&self) -> TriMeshSizeEstimates;

    /// Export the merged collision mesh, `None` when nothing participates
    fn physics_tri_mesh_data(&self) -> Option<TriMeshCollisionData>;

    /// True iff at least one section carries collision triangles
    fn contains_physics_tri_mesh_data(&self) -> bool;

    /// Mirrored (negative X) collision is never requested
    fn wants_neg_x_tri_mesh(&self) -> bool {
        false
    }
}
