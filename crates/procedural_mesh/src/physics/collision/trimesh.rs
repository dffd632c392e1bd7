//! Merged triangle mesh exported to the physics subsystem
//!
//! Sections are concatenated in store order. Each appended section's indices
//! are offset by the number of vertices already in the mesh, and every
//! triangle records which section produced it.

use crate::foundation::math::Vec3;
use crate::mesh::MeshSection;

/// Size hint the physics subsystem uses to reserve memory before export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriMeshSizeEstimates {
    /// Total vertex count across collision-enabled sections
    pub vertices: usize,
}

/// Triangle mesh collision data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMeshCollisionData {
    /// Concatenated vertex positions
    pub vertices: Vec<Vec3>,
    /// Triangles as vertex index triples into `vertices`
    pub indices: Vec<[u32; 3]>,
    /// Per-triangle provenance: the section index that produced the triangle
    pub material_indices: Vec<u32>,
    /// Cook with reversed winding
    pub flip_normals: bool,
    /// The mesh changes at runtime
    pub deformable_mesh: bool,
    /// Prefer fast, lower-quality cooking
    pub fast_cook: bool,
}

impl TriMeshCollisionData {
    /// Merge every section that participates in collision
    ///
    /// The export always flips normals and is marked deformable and
    /// fast-cook eligible.
    pub fn from_sections(sections: &[MeshSection]) -> Self {
        let mut data = Self {
            flip_normals: true,
            deformable_mesh: true,
            fast_cook: true,
            ..Default::default()
        };

        for (section_index, section) in sections.iter().enumerate() {
            if !section.participates_in_collision() {
                continue;
            }
            data.append_section(section_index, section);
        }

        data
    }

    fn append_section(&mut self, section_index: usize, section: &MeshSection) {
        let Some(triangles) = self.offset_triangles(section) else {
            log::warn!(
                "Section {} skipped from collision: indices exceed its {} vertices",
                section_index,
                section.vertex_buffer.len()
            );
            return;
        };

        self.vertices.extend(section.positions());
        self.material_indices
            .extend(std::iter::repeat(section_index as u32).take(triangles.len()));
        self.indices.extend(triangles);
    }

    /// Section triangles rebased onto the merged vertex list
    ///
    /// `None` if an index is outside the section or the merged index would
    /// not fit in `u32`.
    fn offset_triangles(&self, section: &MeshSection) -> Option<Vec<[u32; 3]>> {
        let index_base = u32::try_from(self.vertices.len()).ok()?;
        let vertex_count = section.vertex_buffer.len();
        let rebase = |i: u32| {
            if (i as usize) < vertex_count {
                i.checked_add(index_base)
            } else {
                None
            }
        };

        // `participates_in_collision` guarantees whole triangles.
        section
            .index_buffer
            .chunks_exact(3)
            .map(|tri| Some([rebase(tri[0])?, rebase(tri[1])?, rebase(tri[2])?]))
            .collect()
    }

    /// Number of triangles
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// No triangles were exported
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
