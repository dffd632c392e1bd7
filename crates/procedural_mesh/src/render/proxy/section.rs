//! Per-section GPU mirror

use std::sync::Arc;

use bitflags::bitflags;

use crate::foundation::math::Mat4;
use crate::mesh::vertex::{MeshVertex, VertexAttributes};
use crate::render::batch::{MeshBatch, MeshBatchElement, PrimitiveType};
use crate::render::device::{BufferUsage, GpuBuffer, IndexBufferTag, RenderDevice, VertexBufferTag};
use crate::render::material::{Material, MaterialRenderProxy};
use crate::render::raytracing::{RayTracingGeometry, RayTracingGeometryInitializer, RayTracingSegment};
use crate::render::sync::SectionSnapshot;
use crate::render::RenderResult;
use crate::scene::AABB;

bitflags! {
    /// Render eligibility of one section, fixed at proxy creation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SectionFlags: u8 {
        /// At least one whole triangle
        const VALID = 1 << 0;
        /// Section visibility flag
        const VISIBLE = 1 << 1;
        /// Component draws in the main pass
        const MAIN_PASS = 1 << 2;
        /// Component casts shadows
        const CAST_SHADOW = 1 << 3;
        /// Component is not movable
        const STATIC = 1 << 4;
    }
}

/// GPU buffers owned by one section
#[derive(Debug)]
pub struct SectionBuffers {
    /// Positions, 12 bytes per vertex
    pub positions: GpuBuffer<VertexBufferTag>,
    /// Normal, tangent and UV
    pub attributes: GpuBuffer<VertexBufferTag>,
    /// RGBA8 colors
    pub colors: GpuBuffer<VertexBufferTag>,
    /// 32-bit indices
    pub indices: GpuBuffer<IndexBufferTag>,
    /// Vertices uploaded
    pub num_vertices: u32,
    /// Indices uploaded
    pub num_indices: u32,
}

impl SectionBuffers {
    fn upload(
        device: &Arc<dyn RenderDevice>,
        section_index: usize,
        vertices: &[MeshVertex],
        indices: &[u32],
    ) -> RenderResult<Self> {
        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        let attributes: Vec<VertexAttributes> = vertices.iter().map(VertexAttributes::from).collect();
        let colors: Vec<[u8; 4]> = vertices.iter().map(|v| v.color).collect();

        Ok(Self {
            positions: GpuBuffer::new(
                device,
                &format!("ProcMesh.Section{}.Positions", section_index),
                BufferUsage::Vertex,
                bytemuck::cast_slice(&positions),
            )?,
            attributes: GpuBuffer::new(
                device,
                &format!("ProcMesh.Section{}.Attributes", section_index),
                BufferUsage::Vertex,
                bytemuck::cast_slice(&attributes),
            )?,
            colors: GpuBuffer::new(
                device,
                &format!("ProcMesh.Section{}.Colors", section_index),
                BufferUsage::Vertex,
                bytemuck::cast_slice(&colors),
            )?,
            indices: GpuBuffer::new(
                device,
                &format!("ProcMesh.Section{}.Indices", section_index),
                BufferUsage::Index,
                bytemuck::cast_slice(indices),
            )?,
            num_vertices: vertices.len() as u32,
            num_indices: indices.len() as u32,
        })
    }

    /// Bytes across all four buffers
    pub fn total_size(&self) -> usize {
        self.positions.size() + self.attributes.size() + self.colors.size() + self.indices.size()
    }
}

/// Render-thread mirror of one mesh section
///
/// Invalid sections keep their slot so indices line up with the store, but
/// own no GPU resources and never draw.
#[derive(Debug)]
pub struct ProxySection {
    section_index: usize,
    material: Arc<Material>,
    flags: SectionFlags,
    local_box: AABB,
    buffers: Option<SectionBuffers>,
    ray_tracing: Option<RayTracingGeometry>,
}

impl ProxySection {
    /// Mirror a snapshot section, uploading buffers if it is renderable
    pub(crate) fn new(
        device: &Arc<dyn RenderDevice>,
        snapshot: &SectionSnapshot,
        component_flags: SectionFlags,
        build_ray_tracing: bool,
    ) -> RenderResult<Self> {
        let valid = snapshot.is_valid_for_rendering();
        let mut flags = component_flags & (SectionFlags::MAIN_PASS | SectionFlags::CAST_SHADOW | SectionFlags::STATIC);
        flags.set(SectionFlags::VALID, valid);
        flags.set(SectionFlags::VISIBLE, snapshot.visible);

        let buffers = if valid {
            Some(SectionBuffers::upload(device, snapshot.section_index, &snapshot.vertices, &snapshot.indices)?)
        } else {
            None
        };

        let ray_tracing = match &buffers {
            Some(buffers) if build_ray_tracing => {
                let num_primitives = buffers.num_indices / 3;
                Some(RayTracingGeometry::new(RayTracingGeometryInitializer {
                    debug_name: format!("ProcMesh.Section{}", snapshot.section_index),
                    index_buffer: buffers.indices.handle(),
                    total_primitive_count: num_primitives,
                    fast_build: true,
                    allow_update: false,
                    segments: vec![RayTracingSegment {
                        vertex_buffer: buffers.positions.handle(),
                        vertex_buffer_stride: std::mem::size_of::<[f32; 3]>() as u32,
                        max_vertices: buffers.num_vertices,
                        first_primitive: 0,
                        num_primitives,
                    }],
                }))
            }
            _ => None,
        };

        Ok(Self {
            section_index: snapshot.section_index,
            material: Arc::clone(&snapshot.material),
            flags,
            local_box: snapshot.local_box,
            buffers,
            ray_tracing,
        })
    }

    /// Index in the section store
    pub fn section_index(&self) -> usize {
        self.section_index
    }

    /// Resolved material
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Eligibility flags
    pub fn flags(&self) -> SectionFlags {
        self.flags
    }

    /// Local bounds of the section
    pub fn local_box(&self) -> &AABB {
        &self.local_box
    }

    /// GPU buffers, present only for valid sections
    pub fn buffers(&self) -> Option<&SectionBuffers> {
        self.buffers.as_ref()
    }

    /// Ray-tracing geometry, if built for this section
    pub fn ray_tracing_geometry(&self) -> Option<&RayTracingGeometry> {
        self.ray_tracing.as_ref()
    }

    pub(crate) fn ray_tracing_geometry_mut(&mut self) -> Option<&mut RayTracingGeometry> {
        self.ray_tracing.as_mut()
    }

    /// Valid geometry with uploaded buffers
    pub fn can_render(&self) -> bool {
        self.flags.contains(SectionFlags::VALID) && self.buffers.is_some()
    }

    /// Renderable and visible
    pub fn should_render(&self) -> bool {
        self.can_render() && self.flags.contains(SectionFlags::VISIBLE)
    }

    /// Drawn from the cached static list
    pub fn should_render_static_path(&self) -> bool {
        self.should_render() && self.flags.contains(SectionFlags::MAIN_PASS | SectionFlags::STATIC)
    }

    /// Drawn per frame
    pub fn should_render_dynamic_path(&self) -> bool {
        self.should_render()
            && self.flags.contains(SectionFlags::MAIN_PASS)
            && !self.flags.contains(SectionFlags::STATIC)
    }

    /// Drawn into shadow depth
    pub fn should_render_shadow(&self) -> bool {
        self.should_render() && self.flags.contains(SectionFlags::CAST_SHADOW)
    }

    /// Build a draw for this section, `None` if it cannot render
    pub(crate) fn mesh_batch(
        &self,
        material: MaterialRenderProxy,
        local_to_world: Mat4,
        reverse_culling: bool,
        wireframe: bool,
        dithered_lod_transition: bool,
    ) -> Option<MeshBatch> {
        let buffers = self.buffers.as_ref()?;
        Some(MeshBatch {
            section_index: self.section_index,
            position_buffer: buffers.positions.handle(),
            attribute_buffer: buffers.attributes.handle(),
            color_buffer: buffers.colors.handle(),
            elements: vec![MeshBatchElement {
                index_buffer: buffers.indices.handle(),
                first_index: 0,
                num_primitives: buffers.num_indices / 3,
                min_vertex_index: 0,
                max_vertex_index: buffers.num_vertices.saturating_sub(1),
            }],
            material,
            primitive_type: PrimitiveType::TriangleList,
            local_to_world,
            reverse_culling,
            cast_shadow: self.should_render_shadow(),
            use_for_depth_pass: true,
            wireframe,
            dithered_lod_transition,
            lod_index: 0,
            can_apply_view_mode_overrides: true,
        })
    }

    /// GPU bytes held by this section
    pub fn gpu_bytes(&self) -> usize {
        self.buffers.as_ref().map_or(0, SectionBuffers::total_size)
            + self.ray_tracing.as_ref().map_or(0, RayTracingGeometry::allocated_size)
    }
}
