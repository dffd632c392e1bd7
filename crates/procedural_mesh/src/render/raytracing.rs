//! Ray-tracing geometry for proxy sections
//!
//! Each valid section gets a geometry description up front. The acceleration
//! structure itself is only built the first time an instance is requested,
//! and is released together with the section.

use std::sync::Arc;

use crate::foundation::collections::TypedHandle;
use crate::foundation::math::Mat4;
use super::batch::MeshBatch;
use super::device::{AccelerationStructureTag, GpuBuffer, IndexBufferTag, RenderDevice, VertexBufferTag};
use super::RenderResult;

/// Vertex range of a ray-tracing geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayTracingSegment {
    /// Position buffer
    pub vertex_buffer: TypedHandle<VertexBufferTag>,
    /// Bytes between positions
    pub vertex_buffer_stride: u32,
    /// Vertices addressable by this segment
    pub max_vertices: u32,
    /// First triangle
    pub first_primitive: u32,
    /// Triangle count
    pub num_primitives: u32,
}

/// Description used to build an acceleration structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RayTracingGeometryInitializer {
    /// Debug name
    pub debug_name: String,
    /// Index buffer
    pub index_buffer: TypedHandle<IndexBufferTag>,
    /// Triangles across all segments
    pub total_primitive_count: u32,
    /// Prefer build speed over trace speed
    pub fast_build: bool,
    /// Geometry can be refit in place
    pub allow_update: bool,
    /// Vertex ranges
    pub segments: Vec<RayTracingSegment>,
}

impl RayTracingGeometryInitializer {
    /// Rough acceleration structure size in bytes
    pub fn estimated_size(&self) -> usize {
        let index_bytes = self.total_primitive_count as usize * 3 * std::mem::size_of::<u32>();
        let vertex_bytes: usize = self
            .segments
            .iter()
            .map(|s| s.max_vertices as usize * s.vertex_buffer_stride as usize)
            .sum();
        index_bytes + vertex_bytes
    }
}

/// Lazily built ray-tracing geometry
#[derive(Debug)]
pub struct RayTracingGeometry {
    initializer: RayTracingGeometryInitializer,
    acceleration_structure: Option<GpuBuffer<AccelerationStructureTag>>,
}

impl RayTracingGeometry {
    /// Describe the geometry without building it
    pub fn new(initializer: RayTracingGeometryInitializer) -> Self {
        Self {
            initializer,
            acceleration_structure: None,
        }
    }

    /// Build description
    pub fn initializer(&self) -> &RayTracingGeometryInitializer {
        &self.initializer
    }

    /// Acceleration structure exists
    pub fn is_built(&self) -> bool {
        self.acceleration_structure.is_some()
    }

    /// Build the acceleration structure if it does not exist yet
    pub fn ensure_built(&mut self, device: &Arc<dyn RenderDevice>) -> RenderResult<()> {
        if self.acceleration_structure.is_none() {
            let key = device.create_ray_tracing_geometry(&self.initializer)?;
            self.acceleration_structure = Some(GpuBuffer::from_key(device, key, self.initializer.estimated_size()));
            log::trace!("Built ray tracing geometry '{}'", self.initializer.debug_name);
        }
        Ok(())
    }

    /// Bytes held by the acceleration structure
    pub fn allocated_size(&self) -> usize {
        self.acceleration_structure.as_ref().map_or(0, GpuBuffer::size)
    }
}

/// One placement of a section's ray-tracing geometry in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct RayTracingInstance {
    /// Section this instance comes from
    pub section_index: usize,
    /// Batch used for hit shading
    pub materials: Vec<MeshBatch>,
    /// World transforms, one per instance
    pub transforms: Vec<Mat4>,
}
