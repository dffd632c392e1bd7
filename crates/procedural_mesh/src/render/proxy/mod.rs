//! Scene proxy: the render thread's immutable copy of a procedural mesh
//!
//! A proxy is built in one go from a [`RenderSnapshot`](super::RenderSnapshot)
//! and never partially updated. Any content change produces a new proxy; the
//! old one is dropped and its GPU resources are released.

mod section;
mod scene_proxy;

pub use section::{ProxySection, SectionBuffers, SectionFlags};
pub use scene_proxy::SceneProxy;
