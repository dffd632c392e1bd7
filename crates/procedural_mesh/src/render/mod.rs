//! Render-thread representation of procedural meshes
//!
//! # Architecture
//!
//! The owning thread never touches GPU resources. It publishes a
//! [`RenderSnapshot`] with a generation number; the render thread builds a
//! [`SceneProxy`] from it, replacing (and releasing) the previous proxy.
//!
//! - [`device`] - GPU resource allocation contract and a headless implementation
//! - [`material`] - Material descriptors, relevance and default fallback
//! - [`view`] - View family, show flags and view relevance
//! - [`batch`] - Mesh batches, the static draw list and the per-frame collector
//! - [`raytracing`] - Ray-tracing geometry and instances
//! - [`proxy`] - The scene proxy and its per-section GPU mirrors
//! - [`sync`] - Snapshot handoff between the owning and render threads

pub mod device;
pub mod material;
pub mod view;
pub mod batch;
pub mod raytracing;
pub mod proxy;
pub mod sync;

pub use device::{
    RenderDevice,
    HeadlessDevice,
    BufferUsage,
    GpuBuffer,
    VertexBufferTag,
    IndexBufferTag,
    AccelerationStructureTag,
};
pub use material::{
    Material,
    MaterialId,
    BlendMode,
    MaterialRelevance,
    MaterialRenderProxy,
    MaterialResolver,
    DefaultMaterialResolver,
};
pub use view::{SceneView, ViewFamily, ShowFlags, ViewRelevance};
pub use batch::{MeshBatch, MeshBatchElement, StaticDrawList, MeshElementCollector, PrimitiveType};
pub use raytracing::{RayTracingGeometry, RayTracingGeometryInitializer, RayTracingInstance, RayTracingSegment};
pub use proxy::{SceneProxy, ProxySection, SectionFlags};
pub use sync::{
    RenderSnapshot,
    SectionSnapshot,
    RenderStateTracker,
    RenderMessage,
    RenderStatePublisher,
    RenderStateReceiver,
    SceneProxyHost,
    render_channel,
};

use thiserror::Error;

/// Result type for render-side operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while creating or using GPU resources
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The device refused to create a resource
    #[error("Failed to create {kind} '{label}': {reason}")]
    ResourceCreationFailed {
        /// Resource kind
        kind: &'static str,
        /// Debug label
        label: String,
        /// Device-specific reason
        reason: String,
    },

    /// A handle did not refer to a live resource
    #[error("Invalid resource handle")]
    InvalidHandle,

    /// Any other device failure
    #[error("Render backend error: {0}")]
    BackendError(String),
}
