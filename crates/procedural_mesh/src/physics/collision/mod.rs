//! Collision geometry sources
//!
//! # Module Organization
//!
//! - [`convex`] - Simple-collision convex hulls added by the host
//! - [`trimesh`] - Merged triangle mesh exported from collision-enabled sections
//! - [`provider`] - The query triple the physics subsystem calls

pub mod convex;
pub mod trimesh;
pub mod provider;

pub use convex::{ConvexElem, MIN_HULL_POINTS};
pub use trimesh::{TriMeshCollisionData, TriMeshSizeEstimates};
pub use provider::CollisionDataProvider;
