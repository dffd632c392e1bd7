//! One section of a procedural mesh
//!
//! Each section has its own vertex/index buffers, material slot, visibility
//! and collision flags. A section can exist in the store while being invalid
//! for rendering (fewer than three vertices, or an index count that is not a
//! positive multiple of three); such sections are skipped by the proxy and by
//! the collision export, never repaired.

use crate::foundation::math::Vec3;
use crate::scene::AABB;
use super::error::{MeshError, MeshResult};
use super::vertex::MeshVertex;

/// Geometry and flags for one independently-materialed chunk of mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSection {
    /// Vertex buffer for this section
    pub vertex_buffer: Vec<MeshVertex>,

    /// Triangle list indices into `vertex_buffer`
    pub index_buffer: Vec<u32>,

    /// Slot in the owning component's material list; `None` resolves to the default material
    pub material_index: Option<usize>,

    /// Local bounding box of the section, derived from `vertex_buffer`
    pub section_local_box: AABB,

    /// Should we build collision data for triangles in this section
    pub enable_collision: bool,

    /// Should we display this section
    pub visible: bool,
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            vertex_buffer: Vec::new(),
            index_buffer: Vec::new(),
            material_index: None,
            section_local_box: AABB::empty(),
            enable_collision: false,
            visible: true,
        }
    }
}

impl MeshSection {
    /// Build a section from already-validated geometry
    pub fn from_geometry(vertex_buffer: Vec<MeshVertex>, index_buffer: Vec<u32>) -> Self {
        let mut section = Self {
            vertex_buffer,
            index_buffer,
            ..Default::default()
        };
        section.update_local_box();
        section
    }

    /// Reset this section, clear all mesh info
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace geometry, keeping material and visibility
    pub fn set_geometry(&mut self, vertex_buffer: Vec<MeshVertex>, index_buffer: Vec<u32>) {
        self.vertex_buffer = vertex_buffer;
        self.index_buffer = index_buffer;
        self.update_local_box();
    }

    /// Recompute the cached local box from vertex positions
    pub fn update_local_box(&mut self) {
        self.section_local_box = AABB::from_points(self.positions());
    }

    /// Vertex positions in buffer order
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertex_buffer.iter().map(MeshVertex::position)
    }

    /// Number of whole triangles
    pub fn num_triangles(&self) -> usize {
        self.index_buffer.len() / 3
    }

    /// At least three vertices and a non-empty triangle list
    pub fn is_valid_for_rendering(&self) -> bool {
        self.vertex_buffer.len() >= 3
            && self.index_buffer.len() >= 3
            && self.index_buffer.len() % 3 == 0
    }

    /// Contributes triangles to the merged collision mesh
    pub fn participates_in_collision(&self) -> bool {
        self.enable_collision && self.is_valid_for_rendering()
    }
}

/// Convert positions to the internal vertex representation
pub(crate) fn vertices_from_positions(positions: &[Vec3]) -> Vec<MeshVertex> {
    positions.iter().copied().map(MeshVertex::from_position).collect()
}

/// Validate host triangle indices and convert them to `u32`
///
/// Negative values and values at or past `vertex_count` are rejected rather
/// than wrapped.
pub(crate) fn convert_triangle_indices(
    section: usize,
    triangles: &[i32],
    vertex_count: usize,
) -> MeshResult<Vec<u32>> {
    triangles
        .iter()
        .enumerate()
        .map(|(position, &value)| {
            let index = u32::try_from(value)
                .map_err(|_| MeshError::NegativeIndex { section, position, value })?;
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange { section, position, value: index, vertex_count });
            }
            Ok(index)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshSection {
        MeshSection::from_geometry(
            vertices_from_positions(&[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ]),
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_default_section_is_visible_without_collision() {
        let section = MeshSection::default();
        assert!(section.visible);
        assert!(!section.enable_collision);
        assert!(!section.is_valid_for_rendering());
        assert!(!section.section_local_box.is_valid());
    }

    #[test]
    fn test_local_box_follows_geometry() {
        let section = triangle();
        assert_eq!(section.section_local_box.min, Vec3::zeros());
        assert_eq!(section.section_local_box.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(section.num_triangles(), 1);
    }

    #[test]
    fn test_partial_triangle_is_not_renderable() {
        let mut section = triangle();
        section.index_buffer.push(0);
        assert!(!section.is_valid_for_rendering());
        section.enable_collision = true;
        assert!(!section.participates_in_collision());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut section = triangle();
        section.enable_collision = true;
        section.visible = false;
        section.material_index = Some(3);
        section.reset();
        assert_eq!(section, MeshSection::default());
    }

    #[test]
    fn test_convert_indices_rejects_negative() {
        let err = convert_triangle_indices(2, &[0, -1, 2], 3).unwrap_err();
        assert_eq!(err, MeshError::NegativeIndex { section: 2, position: 1, value: -1 });
    }

    #[test]
    fn test_convert_indices_rejects_out_of_range() {
        let err = convert_triangle_indices(0, &[0, 1, 3], 3).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { value: 3, vertex_count: 3, .. }));
    }

    #[test]
    fn test_convert_indices_accepts_valid() {
        assert_eq!(convert_triangle_indices(0, &[2, 1, 0], 3).unwrap(), vec![2, 1, 0]);
    }
}
