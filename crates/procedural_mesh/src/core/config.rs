//! # Unified Configuration
//!
//! Configuration structures for the procedural mesh component and the scene
//! proxy built from it. Everything here is plain serde data so hosts can keep
//! it in TOML or RON next to their other engine settings.
//!
//! ## Configuration Categories
//!
//! - **Component Config**: collision cooking mode, mobility, pass eligibility
//! - **Render Settings**: ray tracing, debug view modes, wireframe color

use serde::{Serialize, Deserialize};

use crate::scene::Mobility;

// Re-export from the base config module for compatibility
pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Mesh Component Configuration
///
/// Game-thread behaviour of a [`ProceduralMeshComponent`](crate::mesh::ProceduralMeshComponent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshComponentConfig {
    /// Cook collision on a background worker instead of blocking the caller
    pub use_async_cooking: bool,
    /// Use the merged triangle mesh for simple collision queries as well
    pub use_complex_as_simple_collision: bool,
    /// Whether sections draw in the main pass
    pub render_in_main_pass: bool,
    /// Whether sections cast shadows
    pub cast_shadow: bool,
    /// Static components take the cached static draw path
    pub mobility: Mobility,
    /// Whether the physics subsystem should see this component at all
    pub collision_enabled: bool,
    /// Draw into the custom depth buffer
    pub render_custom_depth: bool,
    /// Lighting channel mask, bit 0 is the default channel
    pub lighting_channels: u8,
}

impl Default for MeshComponentConfig {
    fn default() -> Self {
        Self {
            use_async_cooking: false,
            use_complex_as_simple_collision: true,
            render_in_main_pass: true,
            cast_shadow: true,
            mobility: Mobility::Static,
            collision_enabled: true,
            render_custom_depth: false,
            lighting_channels: 0b001,
        }
    }
}

impl MeshComponentConfig {
    /// Enable or disable async cooking
    pub fn with_async_cooking(mut self, enabled: bool) -> Self {
        self.use_async_cooking = enabled;
        self
    }

    /// Set component mobility
    pub fn with_mobility(mut self, mobility: Mobility) -> Self {
        self.mobility = mobility;
        self
    }

    /// Toggle complex-as-simple collision
    pub fn with_complex_as_simple(mut self, enabled: bool) -> Self {
        self.use_complex_as_simple_collision = enabled;
        self
    }
}

/// # Render Settings
///
/// Render-thread options the scene proxy reads at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Build per-section ray tracing geometry when the device supports it
    pub ray_tracing_enabled: bool,
    /// Allow wireframe and other debug view modes to override materials
    pub allow_debug_viewmodes: bool,
    /// Linear RGB color of the wireframe override material
    pub wireframe_color: [f32; 3],
    /// Whether the host renderer uses a GPU scene (primitive data in a GPU buffer)
    pub supports_gpu_scene: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            ray_tracing_enabled: true,
            allow_debug_viewmodes: cfg!(debug_assertions),
            wireframe_color: [0.0, 0.5, 1.0],
            supports_gpu_scene: true,
        }
    }
}

impl RenderSettings {
    /// Validate color channels
    pub fn validate(&self) -> Result<(), String> {
        if self.wireframe_color.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(format!("Wireframe color must be finite and non-negative: {:?}", self.wireframe_color));
        }
        Ok(())
    }
}

/// # Procedural Mesh Configuration
///
/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProceduralMeshConfig {
    /// Component settings
    pub component: MeshComponentConfig,
    /// Render settings
    pub render: RenderSettings,
}

impl ProceduralMeshConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate().map_err(ConfigError::Invalid)
    }
}

impl Config for ProceduralMeshConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_static_sync_cooking() {
        let config = ProceduralMeshConfig::default();
        assert!(!config.component.use_async_cooking);
        assert_eq!(config.component.mobility, Mobility::Static);
        assert_eq!(config.render.wireframe_color, [0.0, 0.5, 1.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = r#"
            [component]
            use_async_cooking = true
            mobility = "Movable"
        "#;
        let config: ProceduralMeshConfig = toml::from_str(text).unwrap();

        assert!(config.component.use_async_cooking);
        assert_eq!(config.component.mobility, Mobility::Movable);
        assert!(config.component.render_in_main_pass);
        assert!(config.render.ray_tracing_enabled);
    }

    #[test]
    fn test_save_and_load_ron() {
        let path = std::env::temp_dir().join(format!("procedural_mesh_config_{}.ron", std::process::id()));

        let config = ProceduralMeshConfig {
            component: MeshComponentConfig::default().with_async_cooking(true),
            render: RenderSettings::default(),
        };
        config.save_to_file(&path).unwrap();
        let loaded = ProceduralMeshConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let result = ProceduralMeshConfig::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_toml_text_round_trip_keeps_mobility() {
        let config = ProceduralMeshConfig {
            component: MeshComponentConfig::default().with_mobility(Mobility::Stationary),
            render: RenderSettings::default(),
        };
        let text = config.to_string_as(ConfigFormat::Toml).unwrap();
        let parsed = ProceduralMeshConfig::from_str_as(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed.component.mobility, Mobility::Stationary);
    }

    #[test]
    fn test_invalid_wireframe_color() {
        let mut config = ProceduralMeshConfig::default();
        config.render.wireframe_color = [f32::NAN, 0.0, 0.0];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
