//! GPU resource allocation contract
//!
//! Proxies only ever allocate and release through [`RenderDevice`]. Buffers
//! are wrapped in [`GpuBuffer`], which releases its allocation on drop, so a
//! proxy section's resources live exactly as long as the section.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::foundation::collections::{HandleMap, ResourceKey, TypedHandle};
use super::raytracing::RayTracingGeometryInitializer;
use super::{RenderError, RenderResult};

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex stream
    Vertex,
    /// 32-bit index list
    Index,
    /// Ray-tracing acceleration structure
    AccelerationStructure,
}

/// Marker for vertex buffer handles
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum VertexBufferTag {}

/// Marker for index buffer handles
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum IndexBufferTag {}

/// Marker for ray-tracing acceleration structure handles
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum AccelerationStructureTag {}

/// Device interface consumed by the scene proxy
///
/// Implementations must be callable from the render thread.
pub trait RenderDevice: Send + Sync {
    /// Upload `data` into a new buffer
    fn create_buffer(&self, label: &str, usage: BufferUsage, data: &[u8]) -> RenderResult<ResourceKey>;

    /// Release a buffer; releasing an unknown key is an error
    fn release(&self, key: ResourceKey) -> RenderResult<()>;

    /// Build an acceleration structure for the described geometry
    fn create_ray_tracing_geometry(&self, initializer: &RayTracingGeometryInitializer) -> RenderResult<ResourceKey> {
        Err(RenderError::ResourceCreationFailed {
            kind: "ray tracing geometry",
            label: initializer.debug_name.clone(),
            reason: "device does not support ray tracing".to_string(),
        })
    }

    /// Whether ray-tracing geometry can be built
    fn supports_ray_tracing(&self) -> bool {
        false
    }
}

/// Owned GPU buffer, released when dropped
pub struct GpuBuffer<Tag> {
    handle: TypedHandle<Tag>,
    size: usize,
    device: Arc<dyn RenderDevice>,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> GpuBuffer<Tag> {
    /// Allocate and upload
    pub fn new(
        device: &Arc<dyn RenderDevice>,
        label: &str,
        usage: BufferUsage,
        data: &[u8],
    ) -> RenderResult<Self> {
        let key = device.create_buffer(label, usage, data)?;
        Ok(Self::from_key(device, key, data.len()))
    }

    /// Take ownership of a resource the device already created
    pub(crate) fn from_key(device: &Arc<dyn RenderDevice>, key: ResourceKey, size: usize) -> Self {
        Self {
            handle: TypedHandle::new(key),
            size,
            device: Arc::clone(device),
            _tag: PhantomData,
        }
    }

    /// Typed handle to the allocation
    pub fn handle(&self) -> TypedHandle<Tag> {
        self.handle
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<Tag> Drop for GpuBuffer<Tag> {
    fn drop(&mut self) {
        if let Err(e) = self.device.release(self.handle.key()) {
            log::error!("Failed to release GPU buffer: {}", e);
        }
    }
}

impl<Tag> std::fmt::Debug for GpuBuffer<Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("key", &self.handle.key())
            .field("size", &self.size)
            .finish()
    }
}

#[derive(Debug)]
struct Allocation {
    label: String,
    usage: BufferUsage,
    size: usize,
}

#[derive(Debug, Default)]
struct HeadlessState {
    allocations: HandleMap<Allocation>,
    total_created: usize,
    fail_next: usize,
}

/// Device with no GPU behind it
///
/// Tracks allocations in a slot map so tools and tests can check that every
/// buffer a proxy creates is released exactly once.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: Mutex<HeadlessState>,
    ray_tracing: bool,
}

impl HeadlessDevice {
    /// Create a device without ray tracing
    pub fn new() -> Self {
        Self::default()
    }

    /// Report ray-tracing support
    pub fn with_ray_tracing(mut self, enabled: bool) -> Self {
        self.ray_tracing = enabled;
        self
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffers currently allocated
    pub fn live_count(&self) -> usize {
        self.state().allocations.len()
    }

    /// Bytes currently allocated
    pub fn live_bytes(&self) -> usize {
        self.state().allocations.values().map(|a| a.size).sum()
    }

    /// Live buffers of one usage
    pub fn live_count_of(&self, usage: BufferUsage) -> usize {
        self.state().allocations.values().filter(|a| a.usage == usage).count()
    }

    /// Buffers ever created
    pub fn total_created(&self) -> usize {
        self.state().total_created
    }

    /// Make the next `count` allocations fail
    pub fn fail_next_allocations(&self, count: usize) {
        self.state().fail_next = count;
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_buffer(&self, label: &str, usage: BufferUsage, data: &[u8]) -> RenderResult<ResourceKey> {
        let mut state = self.state();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(RenderError::ResourceCreationFailed {
                kind: "buffer",
                label: label.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        state.total_created += 1;
        let key = state.allocations.insert(Allocation {
            label: label.to_string(),
            usage,
            size: data.len(),
        });
        log::trace!("Created {:?} buffer '{}' ({} bytes)", usage, label, data.len());
        Ok(key)
    }

    fn release(&self, key: ResourceKey) -> RenderResult<()> {
        match self.state().allocations.remove(key) {
            Some(allocation) => {
                log::trace!("Released buffer '{}'", allocation.label);
                Ok(())
            }
            None => Err(RenderError::InvalidHandle),
        }
    }

    fn create_ray_tracing_geometry(&self, initializer: &RayTracingGeometryInitializer) -> RenderResult<ResourceKey> {
        if !self.ray_tracing {
            return Err(RenderError::BackendError("ray tracing disabled on headless device".to_string()));
        }
        let mut state = self.state();
        state.total_created += 1;
        Ok(state.allocations.insert(Allocation {
            label: initializer.debug_name.clone(),
            usage: BufferUsage::AccelerationStructure,
            size: initializer.estimated_size(),
        }))
    }

    fn supports_ray_tracing(&self) -> bool {
        self.ray_tracing
    }
}
