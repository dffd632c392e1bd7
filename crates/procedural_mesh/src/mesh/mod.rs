//! Procedural mesh sections
//!
//! The section store and the component that owns it. Host mutation calls land
//! here; bounds, collision and the render-state generation are kept in step
//! on the owning thread.

pub mod vertex;
pub mod section;
pub mod component;
pub mod error;

pub use vertex::MeshVertex;
pub use section::MeshSection;
pub use component::{ProceduralMeshComponent, MeshCollaborators, MAX_SECTION_INDEX};
pub use error::{MeshError, MeshResult};
