//! Scene proxy construction and per-frame queries
//!
//! # Render Paths
//!
//! Sections of an immovable component are drawn from a static list cached at
//! construction. Movable sections are rebuilt into the frame's collector each
//! time a view asks for them. Wireframe, selection and rich debug views force
//! every visible section onto the dynamic path, since cached draws cannot
//! carry per-view overrides.

use std::sync::Arc;

use crate::core::config::RenderSettings;
use crate::foundation::math::Transform;
use crate::render::batch::{MeshElementCollector, StaticDrawList};
use crate::render::device::RenderDevice;
use crate::render::material::{MaterialRelevance, MaterialRenderProxy};
use crate::render::raytracing::RayTracingInstance;
use crate::render::sync::RenderSnapshot;
use crate::render::view::{SceneView, ShowFlags, ViewFamily, ViewRelevance};
use crate::render::RenderResult;
use crate::scene::{BoxSphereBounds, Mobility};
use super::section::{ProxySection, SectionFlags};

/// Render-thread representation of one procedural mesh component
pub struct SceneProxy {
    generation: u64,
    sections: Vec<ProxySection>,
    device: Arc<dyn RenderDevice>,
    settings: RenderSettings,
    local_to_world: Transform,
    bounds: BoxSphereBounds,
    mobility: Mobility,
    selected: bool,
    render_in_main_pass: bool,
    cast_shadow: bool,
    render_custom_depth: bool,
    lighting_channels: u8,
    material_relevance: MaterialRelevance,
    static_draw_list: StaticDrawList,
}

impl SceneProxy {
    /// Build every section mirror from a snapshot
    ///
    /// If any allocation fails the sections built so far are dropped, which
    /// releases their buffers, and the error is returned.
    pub fn from_snapshot(snapshot: &RenderSnapshot, device: Arc<dyn RenderDevice>) -> RenderResult<Self> {
        let mut component_flags = SectionFlags::empty();
        component_flags.set(SectionFlags::MAIN_PASS, snapshot.render_in_main_pass);
        component_flags.set(SectionFlags::CAST_SHADOW, snapshot.cast_shadow);
        component_flags.set(SectionFlags::STATIC, !snapshot.mobility.is_movable());

        let build_ray_tracing = snapshot.settings.ray_tracing_enabled && device.supports_ray_tracing();

        let sections = snapshot
            .sections
            .iter()
            .map(|section| ProxySection::new(&device, section, component_flags, build_ray_tracing))
            .collect::<RenderResult<Vec<_>>>()?;

        let material_relevance = sections
            .iter()
            .filter(|s| s.can_render())
            .fold(MaterialRelevance::empty(), |acc, s| acc | s.material().relevance());

        let mut proxy = Self {
            generation: snapshot.generation,
            sections,
            device,
            settings: snapshot.settings.clone(),
            local_to_world: snapshot.local_to_world,
            bounds: snapshot.bounds,
            mobility: snapshot.mobility,
            selected: snapshot.selected,
            render_in_main_pass: snapshot.render_in_main_pass,
            cast_shadow: snapshot.cast_shadow,
            render_custom_depth: snapshot.render_custom_depth,
            lighting_channels: snapshot.lighting_channels,
            material_relevance,
            static_draw_list: StaticDrawList::new(),
        };
        proxy.rebuild_static_draw_list();

        log::debug!(
            "Scene proxy generation {} built: {} sections, {} static batches",
            proxy.generation,
            proxy.sections.len(),
            proxy.static_draw_list.len()
        );
        Ok(proxy)
    }

    fn rebuild_static_draw_list(&mut self) {
        let mut list = StaticDrawList::new();
        let local_to_world = self.local_to_world.to_matrix();
        let reverse_culling = self.reverse_culling();

        for section in self.sections.iter().filter(|s| s.should_render_static_path()) {
            let material = MaterialRenderProxy::Material(Arc::clone(section.material()));
            let dithered = self.dithered_lod_transition(section, false);
            if let Some(batch) = section.mesh_batch(material, local_to_world, reverse_culling, false, dithered) {
                list.add_mesh(batch);
            }
        }
        self.static_draw_list = list;
    }

    /// Snapshot generation this proxy was built from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Section mirrors in store order
    pub fn sections(&self) -> &[ProxySection] {
        &self.sections
    }

    /// World bounds at build time or last transform update
    pub fn bounds(&self) -> BoxSphereBounds {
        self.bounds
    }

    /// Current primitive transform
    pub fn local_to_world(&self) -> &Transform {
        &self.local_to_world
    }

    /// Static batches cached at construction
    pub fn static_draw_list(&self) -> &StaticDrawList {
        &self.static_draw_list
    }

    /// Move the primitive without rebuilding sections
    pub fn set_transform(&mut self, local_to_world: Transform, bounds: BoxSphereBounds) {
        self.local_to_world = local_to_world;
        self.bounds = bounds;
        self.rebuild_static_draw_list();
    }

    /// Mirrored transforms flip triangle facing
    pub fn reverse_culling(&self) -> bool {
        self.local_to_world.determinant() < 0.0
    }

    fn is_movable(&self) -> bool {
        self.mobility.is_movable()
    }

    fn dithered_lod_transition(&self, section: &ProxySection, ray_tracing: bool) -> bool {
        !ray_tracing && !self.is_movable() && section.material().dithered_lod_transition
    }

    fn wireframe(&self, family: &ViewFamily) -> bool {
        self.settings.allow_debug_viewmodes && family.is_wireframe()
    }

    fn forced_dynamic(&self, family: &ViewFamily) -> bool {
        family.rich_view || self.wireframe(family) || self.selected
    }

    /// What this proxy contributes to a view
    pub fn view_relevance(&self, view: &SceneView) -> ViewRelevance {
        let family = &view.family;
        let any_visible = self.sections.iter().any(ProxySection::should_render);
        let any_static = self.sections.iter().any(ProxySection::should_render_static_path);
        let any_shadow = self.sections.iter().any(ProxySection::should_render_shadow);

        let static_relevance = !self.forced_dynamic(family) && any_static;

        ViewRelevance {
            draw_relevance: any_visible && family.show_flags.contains(ShowFlags::MESHES),
            shadow_relevance: self.cast_shadow && any_shadow && family.show_flags.contains(ShowFlags::SHADOWS),
            static_relevance,
            dynamic_relevance: !static_relevance,
            render_in_main_pass: self.render_in_main_pass,
            render_custom_depth: self.render_custom_depth,
            uses_lighting_channels: self.lighting_channels != 0b001,
            velocity_relevance: self.is_movable()
                && self.material_relevance.contains(MaterialRelevance::OPAQUE)
                && self.render_in_main_pass,
            supports_gpu_scene: self.settings.supports_gpu_scene
                && !self.material_relevance.contains(MaterialRelevance::NO_GPU_SCENE),
            material_relevance: self.material_relevance,
        }
    }

    /// Submit per-frame batches for every view in `visibility_map`
    ///
    /// Bit `i` of `visibility_map` marks `views[i]` as seeing this primitive.
    pub fn get_dynamic_mesh_elements(
        &self,
        views: &[SceneView],
        visibility_map: u32,
        collector: &mut MeshElementCollector,
    ) {
        let local_to_world = self.local_to_world.to_matrix();
        let reverse_culling = self.reverse_culling();

        for (view_index, view) in views.iter().enumerate().take(32) {
            if visibility_map & (1 << view_index) == 0 {
                continue;
            }

            let family = &view.family;
            let wireframe = self.wireframe(family);
            let forced = self.forced_dynamic(family);

            for section in &self.sections {
                if !section.should_render() || !(section.should_render_dynamic_path() || forced) {
                    continue;
                }

                let material = if wireframe {
                    MaterialRenderProxy::Colored {
                        parent: Arc::clone(section.material()),
                        color: self.settings.wireframe_color,
                    }
                } else {
                    MaterialRenderProxy::Material(Arc::clone(section.material()))
                };
                let dithered = self.dithered_lod_transition(section, false);

                if let Some(batch) = section.mesh_batch(material, local_to_world, reverse_culling, wireframe, dithered) {
                    collector.add_mesh(view_index, batch);
                }
            }

            if family.show_flags.contains(ShowFlags::BOUNDS) {
                collector.draw_bounds(view_index, self.bounds);
            }
        }
    }

    /// Ray-tracing instances for visible sections, building geometry on first use
    pub fn get_dynamic_ray_tracing_instances(&mut self, out: &mut Vec<RayTracingInstance>) {
        let local_to_world = self.local_to_world.to_matrix();
        let reverse_culling = self.reverse_culling();
        let device = Arc::clone(&self.device);

        for section in &mut self.sections {
            if !section.should_render() {
                continue;
            }
            let Some(geometry) = section.ray_tracing_geometry_mut() else {
                continue;
            };
            if let Err(e) = geometry.ensure_built(&device) {
                log::error!("Skipping ray tracing for section {}: {}", section.section_index(), e);
                continue;
            }

            let material = MaterialRenderProxy::Material(Arc::clone(section.material()));
            if let Some(batch) = section.mesh_batch(material, local_to_world, reverse_culling, false, false) {
                out.push(RayTracingInstance {
                    section_index: section.section_index(),
                    materials: vec![batch],
                    transforms: vec![local_to_world],
                });
            }
        }
    }

    /// Always considered for ray tracing
    pub fn is_ray_tracing_relevant(&self) -> bool {
        true
    }

    /// Instances are regenerated every frame
    pub fn is_ray_tracing_static_relevant(&self) -> bool {
        false
    }

    /// False if any section material ignores depth
    pub fn can_be_occluded(&self) -> bool {
        !self.material_relevance.contains(MaterialRelevance::DISABLE_DEPTH_TEST)
    }

    /// CPU-side bytes held by the proxy
    pub fn memory_footprint(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.sections.capacity() * std::mem::size_of::<ProxySection>()
            + self.static_draw_list.len() * std::mem::size_of::<crate::render::batch::MeshBatch>()
    }

    /// GPU bytes held by all sections
    pub fn gpu_memory_bytes(&self) -> usize {
        self.sections.iter().map(ProxySection::gpu_bytes).sum()
    }
}

impl std::fmt::Debug for SceneProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneProxy")
            .field("generation", &self.generation)
            .field("sections", &self.sections.len())
            .field("mobility", &self.mobility)
            .field("static_batches", &self.static_draw_list.len())
            .finish()
    }
}
