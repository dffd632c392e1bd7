//! # Core Module
//!
//! Shared configuration for the mesh component and its render-side proxy.
//!
//! ## Organization
//!
//! - **Config**: Component behaviour (collision cooking, mobility, passes) and
//!   render settings (ray tracing, debug view modes)

pub mod config;

// Re-export commonly used config types
pub use config::{
    MeshComponentConfig,
    RenderSettings,
    ProceduralMeshConfig,
    Config,
    ConfigError,
};
