//! Mesh batches and where they are submitted
//!
//! A [`MeshBatch`] is one draw of one proxy section. Static batches are built
//! once into a [`StaticDrawList`] when the proxy is created; dynamic batches
//! are rebuilt every frame into a [`MeshElementCollector`].

use crate::foundation::collections::TypedHandle;
use crate::foundation::math::Mat4;
use crate::scene::BoxSphereBounds;
use super::device::{IndexBufferTag, VertexBufferTag};
use super::material::MaterialRenderProxy;

/// Primitive topology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrimitiveType {
    /// Three indices per triangle
    #[default]
    TriangleList,
}

/// Index range drawn by a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBatchElement {
    /// Index buffer
    pub index_buffer: TypedHandle<IndexBufferTag>,
    /// First index to draw
    pub first_index: u32,
    /// Triangle count
    pub num_primitives: u32,
    /// Lowest vertex referenced
    pub min_vertex_index: u32,
    /// Highest vertex referenced
    pub max_vertex_index: u32,
}

/// One draw of one proxy section
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBatch {
    /// Section in the proxy this batch draws
    pub section_index: usize,
    /// Position stream
    pub position_buffer: TypedHandle<VertexBufferTag>,
    /// Normal/tangent/UV stream
    pub attribute_buffer: TypedHandle<VertexBufferTag>,
    /// Color stream
    pub color_buffer: TypedHandle<VertexBufferTag>,
    /// Index ranges
    pub elements: Vec<MeshBatchElement>,
    /// Material or override
    pub material: MaterialRenderProxy,
    /// Topology
    pub primitive_type: PrimitiveType,
    /// Primitive transform
    pub local_to_world: Mat4,
    /// Flip face culling for mirrored transforms
    pub reverse_culling: bool,
    /// Participates in shadow passes
    pub cast_shadow: bool,
    /// Drawn in the depth prepass
    pub use_for_depth_pass: bool,
    /// Drawn as wireframe
    pub wireframe: bool,
    /// Dithered LOD transition
    pub dithered_lod_transition: bool,
    /// Always zero, procedural meshes have a single LOD
    pub lod_index: u8,
    /// Debug view modes may replace the material
    pub can_apply_view_mode_overrides: bool,
}

impl MeshBatch {
    /// Triangles drawn across all elements
    pub fn num_primitives(&self) -> u32 {
        self.elements.iter().map(|e| e.num_primitives).sum()
    }
}

/// Batches cached once at proxy creation
#[derive(Debug, Clone, Default)]
pub struct StaticDrawList {
    batches: Vec<MeshBatch>,
}

impl StaticDrawList {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a batch
    pub fn add_mesh(&mut self, batch: MeshBatch) {
        self.batches.push(batch);
    }

    /// Cached batches
    pub fn batches(&self) -> &[MeshBatch] {
        &self.batches
    }

    /// Number of cached batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Nothing cached
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Per-frame sink for dynamic batches, one bucket per view
#[derive(Debug, Clone, Default)]
pub struct MeshElementCollector {
    batches: Vec<Vec<MeshBatch>>,
    bounds: Vec<Vec<BoxSphereBounds>>,
}

impl MeshElementCollector {
    /// Collector for `num_views` views
    pub fn new(num_views: usize) -> Self {
        Self {
            batches: vec![Vec::new(); num_views],
            bounds: vec![Vec::new(); num_views],
        }
    }

    /// Submit a batch to one view; out-of-range views are ignored
    pub fn add_mesh(&mut self, view_index: usize, batch: MeshBatch) {
        if let Some(view) = self.batches.get_mut(view_index) {
            view.push(batch);
        }
    }

    /// Request a debug bounds draw in one view
    pub fn draw_bounds(&mut self, view_index: usize, bounds: BoxSphereBounds) {
        if let Some(view) = self.bounds.get_mut(view_index) {
            view.push(bounds);
        }
    }

    /// Batches submitted to a view
    pub fn batches(&self, view_index: usize) -> &[MeshBatch] {
        self.batches.get(view_index).map_or(&[], Vec::as_slice)
    }

    /// Bounds draws requested for a view
    pub fn bounds_draws(&self, view_index: usize) -> &[BoxSphereBounds] {
        self.bounds.get(view_index).map_or(&[], Vec::as_slice)
    }

    /// Batches across all views
    pub fn total_batches(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}
