//! Scene-facing contracts
//!
//! Bounding volumes and the capability interface the host scene uses to
//! treat the mesh component as a renderable primitive.

mod bounds;
mod primitive;

pub use bounds::{AABB, BoxSphereBounds};
pub use primitive::{Mobility, PrimitiveComponent};
