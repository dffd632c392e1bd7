//! Views and what a primitive is relevant to in them

use bitflags::bitflags;

use crate::foundation::math::Mat4;
use super::material::MaterialRelevance;

bitflags! {
    /// Debug and feature toggles for a view family
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShowFlags: u32 {
        /// Draw meshes
        const MESHES = 1 << 0;
        /// Wireframe view mode
        const WIREFRAME = 1 << 1;
        /// Draw primitive bounds
        const BOUNDS = 1 << 2;
        /// Draw shadows
        const SHADOWS = 1 << 3;
        /// Include ray-traced effects
        const RAY_TRACING = 1 << 4;
    }
}

impl Default for ShowFlags {
    fn default() -> Self {
        ShowFlags::MESHES | ShowFlags::SHADOWS
    }
}

/// Settings shared by every view rendered in one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewFamily {
    /// Show flags
    pub show_flags: ShowFlags,
    /// A debug view mode that needs per-frame mesh data
    pub rich_view: bool,
}

impl ViewFamily {
    /// Enable a show flag
    pub fn with_show_flag(mut self, flag: ShowFlags) -> Self {
        self.show_flags.insert(flag);
        self
    }

    /// Mark as a rich debug view
    pub fn with_rich_view(mut self, rich: bool) -> Self {
        self.rich_view = rich;
        self
    }

    /// Wireframe view mode is on
    pub fn is_wireframe(&self) -> bool {
        self.show_flags.contains(ShowFlags::WIREFRAME)
    }
}

/// One camera view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneView {
    /// World to clip space
    pub view_projection: Mat4,
    /// Family-level settings
    pub family: ViewFamily,
}

impl SceneView {
    /// View with an identity projection
    pub fn new(family: ViewFamily) -> Self {
        Self {
            view_projection: Mat4::identity(),
            family,
        }
    }
}

/// What a primitive contributes to a view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewRelevance {
    /// Visible at all in this view
    pub draw_relevance: bool,
    /// Casts shadows in this view
    pub shadow_relevance: bool,
    /// Has cached static draw commands to use
    pub static_relevance: bool,
    /// Needs per-frame dynamic batches
    pub dynamic_relevance: bool,
    /// Draws in the main pass
    pub render_in_main_pass: bool,
    /// Custom depth pass
    pub render_custom_depth: bool,
    /// Non-default lighting channels
    pub uses_lighting_channels: bool,
    /// Writes velocity for motion blur and TAA
    pub velocity_relevance: bool,
    /// Can be drawn through the GPU scene
    pub supports_gpu_scene: bool,
    /// OR of every section material's relevance
    pub material_relevance: MaterialRelevance,
}
