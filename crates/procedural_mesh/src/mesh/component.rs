//! Procedural mesh component
//!
//! Owns the section store and keeps everything derived from it in step:
//! cached local bounds, the collision body and the render-state generation.
//!
//! # Mutation Contract
//!
//! Every public mutation is safe to call with bad input. Rejected calls log a
//! warning and change nothing; the `try_*` variants return the [`MeshError`]
//! instead. A successful structural mutation always:
//!
//! 1. recomputes the cached local bounds,
//! 2. resynchronizes collision when collision data may have changed,
//! 3. marks the render state dirty so the next sync publishes a new snapshot.
//!
//! Removing a section shifts every later section down by one.

use std::sync::Arc;

use crate::core::config::{MeshComponentConfig, ProceduralMeshConfig, RenderSettings};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::{
    AsyncCookService,
    BodySetup,
    CollisionCooker,
    CollisionDataProvider,
    CollisionSyncState,
    CollisionSynchronizer,
    ConvexElem,
    MeshCooker,
    PhysicsScene,
    PhysicsState,
    TriMeshCollisionData,
    TriMeshSizeEstimates,
};
use crate::render::material::{DefaultMaterialResolver, Material, MaterialResolver};
use crate::render::sync::{
    RenderMessage,
    RenderSnapshot,
    RenderStatePublisher,
    RenderStateTracker,
    SectionSnapshot,
};
use crate::scene::{BoxSphereBounds, Mobility, PrimitiveComponent, AABB};
use super::error::{MeshError, MeshResult};
use super::section::{convert_triangle_indices, vertices_from_positions, MeshSection};

/// Largest section index the store accepts; hosts address sections with `i32`
pub const MAX_SECTION_INDEX: usize = i32::MAX as usize;

/// Host services a component talks to
pub struct MeshCollaborators {
    /// Supplies the default material for empty slots
    pub material_resolver: Arc<dyn MaterialResolver>,
    /// Synchronous cooker
    pub cooker: Arc<dyn CollisionCooker>,
    /// Background cooking, used when async cooking is enabled
    pub async_cook_service: Option<Box<dyn AsyncCookService>>,
    /// Receives "recreate physics state" signals
    pub physics_scene: Option<Box<dyn PhysicsScene>>,
}

impl Default for MeshCollaborators {
    fn default() -> Self {
        Self {
            material_resolver: Arc::new(DefaultMaterialResolver::new()),
            cooker: Arc::new(MeshCooker::new()),
            async_cook_service: None,
            physics_scene: None,
        }
    }
}

impl MeshCollaborators {
    /// Use a custom material resolver
    pub fn with_material_resolver(mut self, resolver: Arc<dyn MaterialResolver>) -> Self {
        self.material_resolver = resolver;
        self
    }

    /// Use a custom synchronous cooker
    pub fn with_cooker(mut self, cooker: Arc<dyn CollisionCooker>) -> Self {
        self.cooker = cooker;
        self
    }

    /// Provide a background cook service
    pub fn with_async_cook_service(mut self, service: Box<dyn AsyncCookService>) -> Self {
        self.async_cook_service = Some(service);
        self
    }

    /// Forward physics recreate signals to the host
    pub fn with_physics_scene(mut self, scene: Box<dyn PhysicsScene>) -> Self {
        self.physics_scene = Some(scene);
        self
    }
}

/// Collision view over a section slice
///
/// Lets the synchronizer read sections while the component lends it out
/// mutably.
struct SectionCollisionSource<'a>(&'a [MeshSection]);

impl CollisionDataProvider for SectionCollisionSource<'_> {
    fn tri_mesh_size_estimates(&self) -> TriMeshSizeEstimates {
        TriMeshSizeEstimates {
            vertices: self
                .0
                .iter()
                .filter(|s| s.participates_in_collision())
                .map(|s| s.vertex_buffer.len())
                .sum(),
        }
    }

    fn physics_tri_mesh_data(&self) -> Option<TriMeshCollisionData> {
        let data = TriMeshCollisionData::from_sections(self.0);
        (!data.is_empty()).then_some(data)
    }

    fn contains_physics_tri_mesh_data(&self) -> bool {
        self.0.iter().any(MeshSection::participates_in_collision)
    }
}

/// A runtime-editable mesh made of independent sections
pub struct ProceduralMeshComponent {
    config: MeshComponentConfig,
    render_settings: RenderSettings,
    sections: Vec<MeshSection>,
    materials: Vec<Option<Arc<Material>>>,
    material_resolver: Arc<dyn MaterialResolver>,
    local_box: AABB,
    local_bounds: BoxSphereBounds,
    transform: Transform,
    collision: CollisionSynchronizer,
    render_state: RenderStateTracker,
    selected: bool,
}

impl ProceduralMeshComponent {
    /// Create a component with the default collaborators
    pub fn new(config: ProceduralMeshConfig) -> Self {
        Self::with_collaborators(config, MeshCollaborators::default())
    }

    /// Create a component wired to host services
    pub fn with_collaborators(config: ProceduralMeshConfig, collaborators: MeshCollaborators) -> Self {
        let ProceduralMeshConfig { component, render } = config;

        let mut collision = CollisionSynchronizer::new(collaborators.cooker);
        if let Some(service) = collaborators.async_cook_service {
            collision = collision.with_async_service(service);
        }
        if let Some(scene) = collaborators.physics_scene {
            collision = collision.with_physics_scene(scene);
        }
        collision.set_use_async_cooking(component.use_async_cooking);
        collision.set_use_complex_as_simple(component.use_complex_as_simple_collision);

        Self {
            config: component,
            render_settings: render,
            sections: Vec::new(),
            materials: Vec::new(),
            material_resolver: collaborators.material_resolver,
            local_box: AABB::empty(),
            local_bounds: BoxSphereBounds::default(),
            transform: Transform::identity(),
            collision,
            render_state: RenderStateTracker::new(),
            selected: false,
        }
    }

    /// Component configuration
    pub fn config(&self) -> &MeshComponentConfig {
        &self.config
    }

    /// Render settings handed to proxies
    pub fn render_settings(&self) -> &RenderSettings {
        &self.render_settings
    }

    // ---------------------------------------------------------------------
    // Section store
    // ---------------------------------------------------------------------

    /// Create or replace the section at `index`
    ///
    /// Grows the store with empty sections if needed. Empty geometry, negative
    /// indices and indices past the vertex count are rejected with a warning.
    pub fn create_mesh_section(
        &mut self,
        index: usize,
        vertices: &[Vec3],
        triangles: &[i32],
        material: Option<Arc<Material>>,
        visible: bool,
        enable_collision: bool,
    ) {
        if let Err(e) = self.try_create_mesh_section(index, vertices, triangles, material, visible, enable_collision) {
            log::warn!("create_mesh_section: {}", e);
        }
    }

    /// Checked variant of [`Self::create_mesh_section`]
    pub fn try_create_mesh_section(
        &mut self,
        index: usize,
        vertices: &[Vec3],
        triangles: &[i32],
        material: Option<Arc<Material>>,
        visible: bool,
        enable_collision: bool,
    ) -> MeshResult<()> {
        check_section_index(index)?;
        check_not_empty(index, vertices, triangles.len())?;
        let indices = convert_triangle_indices(index, triangles, vertices.len())?;
        self.install_section(index, vertices, indices, material, visible, enable_collision);
        Ok(())
    }

    /// [`Self::create_mesh_section`] for hosts that already hold unsigned indices
    pub fn create_mesh_section_u32(
        &mut self,
        index: usize,
        vertices: &[Vec3],
        triangles: &[u32],
        material: Option<Arc<Material>>,
        visible: bool,
        enable_collision: bool,
    ) {
        if let Err(e) = self.try_create_mesh_section_u32(index, vertices, triangles, material, visible, enable_collision) {
            log::warn!("create_mesh_section_u32: {}", e);
        }
    }

    /// Checked variant of [`Self::create_mesh_section_u32`]
    pub fn try_create_mesh_section_u32(
        &mut self,
        index: usize,
        vertices: &[Vec3],
        triangles: &[u32],
        material: Option<Arc<Material>>,
        visible: bool,
        enable_collision: bool,
    ) -> MeshResult<()> {
        check_section_index(index)?;
        check_not_empty(index, vertices, triangles.len())?;
        check_index_range(index, triangles, vertices.len())?;
        self.install_section(index, vertices, triangles.to_vec(), material, visible, enable_collision);
        Ok(())
    }

    fn install_section(
        &mut self,
        index: usize,
        vertices: &[Vec3],
        indices: Vec<u32>,
        material: Option<Arc<Material>>,
        visible: bool,
        enable_collision: bool,
    ) {
        if index >= self.sections.len() {
            self.sections.resize_with(index + 1, MeshSection::default);
        }
        let material_index = material.map(|m| self.register_material(m));

        let section = &mut self.sections[index];
        let had_collision = section.participates_in_collision();

        section.reset();
        section.set_geometry(vertices_from_positions(vertices), indices);
        section.material_index = material_index;
        section.visible = visible;
        section.enable_collision = enable_collision;

        log::debug!(
            "Section {} created: {} vertices, {} triangles",
            index,
            vertices.len(),
            self.sections[index].num_triangles()
        );

        self.update_local_bounds();
        if enable_collision || had_collision {
            self.update_collision();
        }
        self.mark_render_state_dirty();
    }

    /// Replace geometry of an existing section, keeping material and visibility
    ///
    /// A missing section is a silent no-op.
    pub fn update_mesh_section(&mut self, index: usize, vertices: &[Vec3], triangles: &[i32], enable_collision: bool) {
        match self.try_update_mesh_section(index, vertices, triangles, enable_collision) {
            Ok(()) => {}
            Err(MeshError::SectionNotFound(_)) => log::debug!("update_mesh_section: no section {}", index),
            Err(e) => log::warn!("update_mesh_section: {}", e),
        }
    }

    /// Checked variant of [`Self::update_mesh_section`]
    pub fn try_update_mesh_section(
        &mut self,
        index: usize,
        vertices: &[Vec3],
        triangles: &[i32],
        enable_collision: bool,
    ) -> MeshResult<()> {
        if index >= self.sections.len() {
            return Err(MeshError::SectionNotFound(index));
        }
        check_not_empty(index, vertices, triangles.len())?;
        let indices = convert_triangle_indices(index, triangles, vertices.len())?;

        let had_collision = self.contains_physics_tri_mesh_data();
        let section = &mut self.sections[index];
        section.set_geometry(vertices_from_positions(vertices), indices);
        section.enable_collision = enable_collision;

        self.update_local_bounds();
        // Collision is one merged body, so any participating section forces a full rebuild.
        if had_collision || self.contains_physics_tri_mesh_data() {
            self.update_collision();
        }
        self.mark_render_state_dirty();
        Ok(())
    }

    /// Replace a whole section value, growing the store if needed
    ///
    /// Sections whose indices reference missing vertices are rejected with a
    /// warning.
    pub fn set_mesh_section(&mut self, index: usize, section: MeshSection) {
        if let Err(e) = self.try_set_mesh_section(index, section) {
            log::warn!("set_mesh_section: {}", e);
        }
    }

    /// Checked variant of [`Self::set_mesh_section`]
    pub fn try_set_mesh_section(&mut self, index: usize, mut section: MeshSection) -> MeshResult<()> {
        check_section_index(index)?;
        check_index_range(index, &section.index_buffer, section.vertex_buffer.len())?;

        if index >= self.sections.len() {
            self.sections.resize_with(index + 1, MeshSection::default);
        }
        section.update_local_box();

        let had_collision = self.sections[index].participates_in_collision();
        let wants_collision = section.enable_collision;
        self.sections[index] = section;

        self.update_local_bounds();
        if had_collision || wants_collision {
            self.update_collision();
        }
        self.mark_render_state_dirty();
        Ok(())
    }

    /// Delete the section at `index`; later sections shift down by one
    pub fn remove_mesh_section(&mut self, index: usize) {
        if index >= self.sections.len() {
            log::debug!("remove_mesh_section: no section {}", index);
            return;
        }
        self.sections.remove(index);

        self.update_local_bounds();
        self.update_collision();
        self.mark_render_state_dirty();
    }

    /// Remove every section
    pub fn clear_all_mesh_sections(&mut self) {
        self.sections.clear();

        self.update_local_bounds();
        self.update_collision();
        self.mark_render_state_dirty();
    }

    /// Number of sections, including empty ones
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// A section exists at `index`
    pub fn section_exists(&self, index: usize) -> bool {
        index < self.sections.len()
    }

    /// The section at `index`
    pub fn mesh_section(&self, index: usize) -> Option<&MeshSection> {
        self.sections.get(index)
    }

    /// All sections in store order
    pub fn mesh_sections(&self) -> &[MeshSection] {
        &self.sections
    }

    /// Show or hide a section; only the render state changes
    pub fn set_section_visible(&mut self, index: usize, visible: bool) {
        let Some(section) = self.sections.get_mut(index) else {
            log::debug!("set_section_visible: no section {}", index);
            return;
        };
        if section.visible != visible {
            section.visible = visible;
            self.mark_render_state_dirty();
        }
    }

    /// Visibility of a section, `false` if it does not exist
    pub fn is_section_visible(&self, index: usize) -> bool {
        self.sections.get(index).map_or(false, |s| s.visible)
    }

    // ---------------------------------------------------------------------
    // Materials
    // ---------------------------------------------------------------------

    fn register_material(&mut self, material: Arc<Material>) -> usize {
        if let Some(slot) = self
            .materials
            .iter()
            .position(|m| m.as_ref().map_or(false, |m| m.id == material.id))
        {
            return slot;
        }
        self.materials.push(Some(material));
        self.materials.len() - 1
    }

    /// Put a material in a slot, growing the slot list if needed
    pub fn set_material(&mut self, slot: usize, material: Option<Arc<Material>>) {
        if slot >= self.materials.len() {
            self.materials.resize(slot + 1, None);
        }
        self.materials[slot] = material;
        self.mark_render_state_dirty();
    }

    /// Raw slot contents, `None` if empty or out of range
    pub fn material_slot(&self, slot: usize) -> Option<&Arc<Material>> {
        self.materials.get(slot).and_then(Option::as_ref)
    }

    fn section_material(&self, section: &MeshSection) -> Arc<Material> {
        let slot = section.material_index.and_then(|i| self.material_slot(i));
        self.material_resolver.resolve(slot)
    }

    // ---------------------------------------------------------------------
    // Convex hulls
    // ---------------------------------------------------------------------

    /// Add a convex hull for simple collision; fewer than four points is rejected
    pub fn add_collision_convex_mesh(&mut self, points: &[Vec3]) {
        if let Err(e) = self.try_add_collision_convex_mesh(points) {
            log::warn!("add_collision_convex_mesh: {}", e);
        }
    }

    /// Checked variant of [`Self::add_collision_convex_mesh`]
    pub fn try_add_collision_convex_mesh(&mut self, points: &[Vec3]) -> MeshResult<()> {
        let elem = ConvexElem::new(points)?;
        self.collision.add_convex_elem(elem);
        self.update_collision();
        Ok(())
    }

    /// Replace every convex hull; point sets with fewer than four points are skipped
    pub fn set_collision_convex_meshes(&mut self, hulls: &[Vec<Vec3>]) {
        let elems = hulls
            .iter()
            .filter_map(|points| match ConvexElem::new(points) {
                Ok(elem) => Some(elem),
                Err(e) => {
                    log::warn!("set_collision_convex_meshes: {}", e);
                    None
                }
            })
            .collect();
        self.collision.set_convex_elems(elems);
        self.update_collision();
    }

    /// Remove every convex hull
    pub fn clear_collision_convex_meshes(&mut self) {
        self.collision.clear_convex_elems();
        self.update_collision();
    }

    /// Convex hulls currently registered
    pub fn collision_convex_elems(&self) -> &[ConvexElem] {
        self.collision.convex_elems()
    }

    // ---------------------------------------------------------------------
    // Collision
    // ---------------------------------------------------------------------

    fn update_collision(&mut self) {
        if !self.config.collision_enabled {
            return;
        }
        let source = SectionCollisionSource(&self.sections);
        // Failures are already logged; the previous body stays authoritative.
        let _ = self.collision.update_collision(&source);
    }

    /// The authoritative physics body
    pub fn body_setup(&self) -> Option<&Arc<BodySetup>> {
        self.collision.body_setup()
    }

    /// Cook-cycle state of the collision body
    pub fn collision_state(&self) -> CollisionSyncState {
        self.collision.state()
    }

    /// Runtime physics state
    pub fn physics_state(&self) -> PhysicsState {
        self.collision.physics_state()
    }

    /// Apply finished async cooks; call once per tick on the owning thread
    pub fn process_async_cook_results(&mut self) -> usize {
        self.collision.process_async_cook_results()
    }

    // ---------------------------------------------------------------------
    // Bounds and transform
    // ---------------------------------------------------------------------

    fn update_local_bounds(&mut self) {
        let mut local_box = AABB::empty();
        for section in &self.sections {
            for position in section.positions() {
                local_box.encapsulate_point(position);
            }
        }
        self.local_box = local_box;
        self.local_bounds = BoxSphereBounds::from_box(&local_box);
    }

    /// Cached union of every vertex position, empty when there are none
    pub fn local_box(&self) -> &AABB {
        &self.local_box
    }

    /// Cached local bounds
    pub fn local_bounds(&self) -> BoxSphereBounds {
        self.local_bounds
    }

    /// World bounds under the current transform
    pub fn bounds(&self) -> BoxSphereBounds {
        self.calc_bounds(&self.transform)
    }

    /// Current world transform
    pub fn world_transform(&self) -> &Transform {
        &self.transform
    }

    /// Move the component; the proxy gets a transform update, not a rebuild
    pub fn set_world_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.render_state.mark_transform_dirty();
    }

    /// Change mobility; switches the proxy between static and dynamic paths
    pub fn set_mobility(&mut self, mobility: Mobility) {
        if self.config.mobility != mobility {
            self.config.mobility = mobility;
            self.mark_render_state_dirty();
        }
    }

    /// Editor selection forces the dynamic path
    pub fn set_selected(&mut self, selected: bool) {
        if self.selected != selected {
            self.selected = selected;
            self.mark_render_state_dirty();
        }
    }

    /// Rebuild derived state after the section store was deserialized
    pub fn post_load(&mut self) {
        for section in &mut self.sections {
            section.update_local_box();
        }
        self.update_local_bounds();
        self.update_collision();
        self.mark_render_state_dirty();
    }

    // ---------------------------------------------------------------------
    // Render state
    // ---------------------------------------------------------------------

    /// Request a proxy rebuild at the next sync point
    pub fn mark_render_state_dirty(&mut self) {
        self.render_state.mark_dirty();
    }

    /// A rebuild is pending
    pub fn is_render_state_dirty(&self) -> bool {
        self.render_state.is_dirty()
    }

    /// Generation of the last published snapshot
    pub fn render_generation(&self) -> u64 {
        self.render_state.generation()
    }

    /// Publish pending render changes; returns `true` if anything was sent
    pub fn send_render_state(&mut self, publisher: &RenderStatePublisher) -> bool {
        if let Some(generation) = self.render_state.take_rebuild() {
            let snapshot = self.snapshot(generation);
            return publisher.publish(RenderMessage::Rebuild(Box::new(snapshot)));
        }
        if self.render_state.take_transform_update() {
            return publisher.publish(RenderMessage::UpdateTransform {
                local_to_world: self.transform,
                bounds: self.bounds(),
            });
        }
        false
    }

    /// Tear down: abort queued cooks and tell the render thread to drop the proxy
    pub fn destroy_render_state(&mut self, publisher: &RenderStatePublisher) {
        self.collision.cancel_pending();
        publisher.publish(RenderMessage::Destroy);
    }

    fn snapshot(&self, generation: u64) -> RenderSnapshot {
        let sections = self
            .sections
            .iter()
            .enumerate()
            .map(|(section_index, section)| SectionSnapshot {
                section_index,
                vertices: section.vertex_buffer.clone(),
                indices: section.index_buffer.clone(),
                material: self.section_material(section),
                visible: section.visible,
                local_box: section.section_local_box,
            })
            .collect();

        RenderSnapshot {
            generation,
            sections,
            local_to_world: self.transform,
            bounds: self.bounds(),
            mobility: self.config.mobility,
            render_in_main_pass: self.config.render_in_main_pass,
            cast_shadow: self.config.cast_shadow,
            render_custom_depth: self.config.render_custom_depth,
            lighting_channels: self.config.lighting_channels,
            selected: self.selected,
            settings: self.render_settings.clone(),
        }
    }
}

fn check_section_index(index: usize) -> MeshResult<()> {
    if index > MAX_SECTION_INDEX {
        return Err(MeshError::SectionIndexTooLarge { index, max: MAX_SECTION_INDEX });
    }
    Ok(())
}

fn check_not_empty(section: usize, vertices: &[Vec3], num_indices: usize) -> MeshResult<()> {
    if vertices.is_empty() || num_indices == 0 {
        return Err(MeshError::EmptyGeometry {
            section,
            vertices: vertices.len(),
            indices: num_indices,
        });
    }
    Ok(())
}

fn check_index_range(section: usize, triangles: &[u32], vertex_count: usize) -> MeshResult<()> {
    match triangles.iter().position(|&i| i as usize >= vertex_count) {
        Some(position) => Err(MeshError::IndexOutOfRange {
            section,
            position,
            value: triangles[position],
            vertex_count,
        }),
        None => Ok(()),
    }
}

impl CollisionDataProvider for ProceduralMeshComponent {
    fn tri_mesh_size_estimates(&self) -> TriMeshSizeEstimates {
        SectionCollisionSource(&self.sections).tri_mesh_size_estimates()
    }

    fn physics_tri_mesh_data(&self) -> Option<TriMeshCollisionData> {
        SectionCollisionSource(&self.sections).physics_tri_mesh_data()
    }

    fn contains_physics_tri_mesh_data(&self) -> bool {
        SectionCollisionSource(&self.sections).contains_physics_tri_mesh_data()
    }
}

impl PrimitiveComponent for ProceduralMeshComponent {
    fn create_render_snapshot(&self) -> RenderSnapshot {
        self.snapshot(self.render_state.generation())
    }

    fn calc_bounds(&self, local_to_world: &Transform) -> BoxSphereBounds {
        self.local_bounds.transform_by(local_to_world)
    }

    fn material(&self, slot: usize) -> Arc<Material> {
        self.material_resolver.resolve(self.material_slot(slot))
    }

    fn num_materials(&self) -> usize {
        self.materials.len()
    }
}

impl std::fmt::Debug for ProceduralMeshComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProceduralMeshComponent")
            .field("sections", &self.sections.len())
            .field("materials", &self.materials.len())
            .field("local_box", &self.local_box)
            .field("collision", &self.collision)
            .field("render_generation", &self.render_state.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::material::MaterialId;

    fn triangle() -> Vec<Vec3> {
        vec![Vec3::zeros(), Vec3::x(), Vec3::y()]
    }

    #[test]
    fn test_create_grows_store_with_empty_sections() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        mesh.create_mesh_section(2, &triangle(), &[0, 1, 2], None, true, false);

        assert_eq!(mesh.num_sections(), 3);
        assert!(mesh.mesh_section(0).unwrap().vertex_buffer.is_empty());
        assert!(!mesh.mesh_section(1).unwrap().is_valid_for_rendering());
        assert!(mesh.mesh_section(2).unwrap().is_valid_for_rendering());
    }

    #[test]
    fn test_negative_index_rejected_without_mutation() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        let result = mesh.try_create_mesh_section(0, &triangle(), &[0, -1, 2], None, true, false);

        assert!(matches!(result, Err(MeshError::NegativeIndex { value: -1, .. })));
        assert_eq!(mesh.num_sections(), 0);
        assert!(!mesh.is_render_state_dirty());
    }

    #[test]
    fn test_u32_create_checks_range() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        let result = mesh.try_create_mesh_section_u32(0, &triangle(), &[0, 1, 3], None, true, false);
        assert!(matches!(result, Err(MeshError::IndexOutOfRange { value: 3, .. })));

        mesh.create_mesh_section_u32(0, &triangle(), &[0, 1, 2], None, true, false);
        assert_eq!(mesh.mesh_section(0).unwrap().index_buffer, vec![0, 1, 2]);
    }

    #[test]
    fn test_update_missing_section_is_silent_noop() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        mesh.update_mesh_section(4, &triangle(), &[0, 1, 2], false);
        assert_eq!(mesh.num_sections(), 0);
        assert_eq!(
            mesh.try_update_mesh_section(4, &triangle(), &[0, 1, 2], false),
            Err(MeshError::SectionNotFound(4))
        );
    }

    #[test]
    fn test_update_keeps_material_and_visibility() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        let material = Arc::new(Material::new(MaterialId(7)));
        mesh.create_mesh_section(0, &triangle(), &[0, 1, 2], Some(material), false, false);

        let moved: Vec<Vec3> = triangle().into_iter().map(|p| p + Vec3::z()).collect();
        mesh.update_mesh_section(0, &moved, &[0, 1, 2], false);

        let section = mesh.mesh_section(0).unwrap();
        assert!(!section.visible);
        assert_eq!(section.material_index, Some(0));
        assert_eq!(mesh.local_box().min.z, 1.0);
    }

    #[test]
    fn test_materials_registered_once() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        let material = Arc::new(Material::new(MaterialId(3)));
        mesh.create_mesh_section(0, &triangle(), &[0, 1, 2], Some(Arc::clone(&material)), true, false);
        mesh.create_mesh_section(1, &triangle(), &[0, 1, 2], Some(material), true, false);

        assert_eq!(mesh.num_materials(), 1);
        assert_eq!(mesh.mesh_section(1).unwrap().material_index, Some(0));
    }

    #[test]
    fn test_missing_material_resolves_to_default() {
        let mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        assert_eq!(mesh.material(5).id, MaterialId(0));
        assert_eq!(mesh.material(5).name.as_deref(), Some("DefaultSurface"));
    }

    #[test]
    fn test_visibility_toggle_marks_dirty_only_on_change() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        mesh.create_mesh_section(0, &triangle(), &[0, 1, 2], None, true, false);
        let (publisher, _receiver) = crate::render::sync::render_channel();
        assert!(mesh.send_render_state(&publisher));

        mesh.set_section_visible(0, true);
        assert!(!mesh.is_render_state_dirty());
        mesh.set_section_visible(0, false);
        assert!(mesh.is_render_state_dirty());
        assert!(!mesh.is_section_visible(0));
        assert!(!mesh.is_section_visible(9));
    }

    #[test]
    fn test_collision_disabled_never_cooks() {
        let mut config = ProceduralMeshConfig::default();
        config.component.collision_enabled = false;
        let mut mesh = ProceduralMeshComponent::new(config);
        mesh.create_mesh_section(0, &triangle(), &[0, 1, 2], None, true, true);

        assert!(mesh.body_setup().is_none());
        assert!(mesh.contains_physics_tri_mesh_data());
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let mut mesh = ProceduralMeshComponent::new(ProceduralMeshConfig::default());
        mesh.create_mesh_section(0, &triangle(), &[0, 1, 2], None, true, false);
        mesh.set_world_transform(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)));

        let bounds = mesh.bounds();
        assert_eq!(bounds.origin, Vec3::new(10.5, 0.5, 0.0));
        assert_eq!(mesh.local_bounds().origin, Vec3::new(0.5, 0.5, 0.0));
    }
}
