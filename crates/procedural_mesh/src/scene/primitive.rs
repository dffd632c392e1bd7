//! Renderable primitive capability
//!
//! The host scene does not know about procedural meshes. It sees anything
//! that can describe its render state, report bounds and hand out materials.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::math::Transform;
use crate::render::material::Material;
use crate::render::sync::RenderSnapshot;
use super::bounds::BoxSphereBounds;

/// Whether a component may move after registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mobility {
    /// Never moves; eligible for cached static draws
    #[default]
    Static,
    /// Does not move, lighting may change
    Stationary,
    /// May move every frame
    Movable,
}

impl Mobility {
    /// Only `Movable` components take the per-frame draw path
    pub fn is_movable(self) -> bool {
        matches!(self, Mobility::Movable)
    }
}

/// Contract between a renderable component and the host scene
pub trait PrimitiveComponent {
    /// Snapshot the current render state for proxy construction
    fn create_render_snapshot(&self) -> RenderSnapshot;

    /// Bounds of the primitive under `local_to_world`
    fn calc_bounds(&self, local_to_world: &Transform) -> BoxSphereBounds;

    /// Material for a slot, falling back to the default material
    fn material(&self, slot: usize) -> Arc<Material>;

    /// Number of material slots
    fn num_materials(&self) -> usize;
}
