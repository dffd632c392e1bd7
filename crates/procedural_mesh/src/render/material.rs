//! Material descriptors as seen by the mesh proxy
//!
//! Material assets are owned by the host. The proxy only needs to know how a
//! material affects pass relevance, so a [`Material`] is a small shared
//! descriptor and [`MaterialResolver`] supplies the fallback when a slot is
//! empty.

use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Unique identifier for materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// How a material's output is combined with the scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    /// Writes depth, fully opaque
    #[default]
    Opaque,
    /// Opaque with alpha-tested holes
    Masked,
    /// Alpha blended
    Translucent,
    /// Added on top of the scene
    Additive,
}

impl BlendMode {
    /// Opaque or masked
    pub fn is_opaque(self) -> bool {
        matches!(self, BlendMode::Opaque | BlendMode::Masked)
    }
}

bitflags! {
    /// Per-material pass relevance, OR-combined across a proxy's sections
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialRelevance: u32 {
        /// Draws in the opaque pass
        const OPAQUE = 1 << 0;
        /// Alpha-tested
        const MASKED = 1 << 1;
        /// Draws in the translucency pass
        const TRANSLUCENT = 1 << 2;
        /// Ignores scene depth
        const DISABLE_DEPTH_TEST = 1 << 3;
        /// Uses dithered LOD transitions
        const DITHERED_LOD_TRANSITION = 1 << 4;
        /// Cannot be drawn through the GPU scene
        const NO_GPU_SCENE = 1 << 5;
    }
}

/// Shared material descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Unique identifier for this material
    pub id: MaterialId,
    /// Optional name for debugging
    pub name: Option<String>,
    /// Blend mode
    pub blend_mode: BlendMode,
    /// Base color, RGBA
    pub base_color: [f32; 4],
    /// Dithered LOD transition support
    pub dithered_lod_transition: bool,
    /// Draw without depth testing
    pub disable_depth_test: bool,
    /// Can be drawn through the GPU scene
    pub supports_gpu_scene: bool,
}

impl Material {
    /// Opaque white material
    pub fn new(id: MaterialId) -> Self {
        Self {
            id,
            name: None,
            blend_mode: BlendMode::Opaque,
            base_color: [1.0, 1.0, 1.0, 1.0],
            dithered_lod_transition: false,
            disable_depth_test: false,
            supports_gpu_scene: true,
        }
    }

    /// Engine fallback surface used for empty material slots
    pub fn default_surface() -> Self {
        Self::new(MaterialId(0)).with_name("DefaultSurface")
    }

    /// Set the material name for debugging
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the blend mode
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Set the base color
    pub fn with_base_color(mut self, color: [f32; 4]) -> Self {
        self.base_color = color;
        self
    }

    /// Enable dithered LOD transitions
    pub fn with_dithered_lod_transition(mut self, dithered: bool) -> Self {
        self.dithered_lod_transition = dithered;
        self
    }

    /// Disable depth testing
    pub fn with_disable_depth_test(mut self, disable: bool) -> Self {
        self.disable_depth_test = disable;
        self
    }

    /// Pass relevance of this material
    pub fn relevance(&self) -> MaterialRelevance {
        let mut relevance = match self.blend_mode {
            BlendMode::Opaque => MaterialRelevance::OPAQUE,
            BlendMode::Masked => MaterialRelevance::OPAQUE | MaterialRelevance::MASKED,
            BlendMode::Translucent | BlendMode::Additive => MaterialRelevance::TRANSLUCENT,
        };
        relevance.set(MaterialRelevance::DISABLE_DEPTH_TEST, self.disable_depth_test);
        relevance.set(MaterialRelevance::DITHERED_LOD_TRANSITION, self.dithered_lod_transition);
        relevance.set(MaterialRelevance::NO_GPU_SCENE, !self.supports_gpu_scene);
        relevance
    }
}

/// What a mesh batch is drawn with
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialRenderProxy {
    /// The section's own material
    Material(Arc<Material>),
    /// Flat color override, used for wireframe views
    Colored {
        /// Material being overridden
        parent: Arc<Material>,
        /// Override color, RGB
        color: [f32; 3],
    },
}

impl MaterialRenderProxy {
    /// Underlying material
    pub fn material(&self) -> &Arc<Material> {
        match self {
            MaterialRenderProxy::Material(material) => material,
            MaterialRenderProxy::Colored { parent, .. } => parent,
        }
    }

    /// Is this a color override
    pub fn is_override(&self) -> bool {
        matches!(self, MaterialRenderProxy::Colored { .. })
    }
}

/// Supplies the material used when a slot is empty
pub trait MaterialResolver: Send + Sync {
    /// The engine default surface
    fn default_material(&self) -> Arc<Material>;

    /// `material` if present, the default otherwise
    fn resolve(&self, material: Option<&Arc<Material>>) -> Arc<Material> {
        material.cloned().unwrap_or_else(|| self.default_material())
    }
}

/// Resolver backed by a single default material
#[derive(Debug, Clone)]
pub struct DefaultMaterialResolver {
    default: Arc<Material>,
}

impl DefaultMaterialResolver {
    /// Use [`Material::default_surface`] as the fallback
    pub fn new() -> Self {
        Self::with_default(Arc::new(Material::default_surface()))
    }

    /// Use a custom fallback
    pub fn with_default(default: Arc<Material>) -> Self {
        Self { default }
    }
}

impl Default for DefaultMaterialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialResolver for DefaultMaterialResolver {
    fn default_material(&self) -> Arc<Material> {
        Arc::clone(&self.default)
    }
}
