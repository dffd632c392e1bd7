//! # Procedural Mesh
//!
//! Runtime-editable meshes made of independent sections, with collision
//! cooking and a render-thread scene proxy.
//!
//! ## Features
//!
//! - **Section Store**: create, update, remove and clear sections at runtime
//! - **Bounds**: cached local bounds, world bounds on demand
//! - **Collision**: merged triangle mesh plus convex hulls, cooked synchronously
//!   or on a background worker with stale results discarded
//! - **Scene Proxy**: GPU mirrors of each section with static/dynamic path
//!   selection and ray-tracing instances
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procedural_mesh::prelude::*;
//!
//! let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
//! let quad = [
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(1.0, 1.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//! ];
//! mesh.create_mesh_section(0, &quad, &[0, 1, 2, 2, 3, 0], None, true, true);
//!
//! let (publisher, receiver) = render_channel();
//! let device = std::sync::Arc::new(HeadlessDevice::new());
//! let mut host = SceneProxyHost::new(device, receiver);
//!
//! mesh.send_render_state(&publisher);
//! host.sync();
//! assert_eq!(host.proxy().map(|p| p.sections().len()), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod foundation;
pub mod config;
pub mod scene;
pub mod mesh;
pub mod physics;
pub mod render;

#[cfg(test)]
mod tests;

/// Common imports for mesh users
pub mod prelude {
    pub use crate::{
        foundation::math::{Vec3, Mat4, Transform},
        core::config::{MeshComponentConfig, RenderSettings, ProceduralMeshConfig, Config},
        scene::{AABB, BoxSphereBounds, Mobility, PrimitiveComponent},
        mesh::{ProceduralMeshComponent, MeshCollaborators, MeshSection, MeshVertex, MeshError},
        physics::{
            CollisionDataProvider, CollisionCooker, MeshCooker, BodySetup,
            AsyncCookService, ThreadedCookService, DeferredCookService, PhysicsScene,
        },
        render::{
            Material, MaterialId, MaterialResolver, RenderDevice, HeadlessDevice,
            SceneProxy, SceneProxyHost, SceneView, ViewFamily, ShowFlags,
            MeshElementCollector, render_channel,
        },
    };
}
