//! Section store and bounds scenarios

use super::*;
use crate::physics::CollisionDataProvider;
use crate::mesh::{MeshError, MAX_SECTION_INDEX};
use crate::scene::AABB;

#[test]
fn test_count_is_one_past_highest_index() {
    let mut mesh = default_mesh();
    for (step, index) in [0usize, 2, 3, 7].into_iter().enumerate() {
        mesh.create_mesh_section(index, &quad_at(step as f32), &QUAD_INDICES, None, true, false);
        assert_eq!(mesh.num_sections(), index + 1);
    }
}

#[test]
fn test_create_then_get_round_trip() {
    let mut mesh = default_mesh();
    let vertices = quad_at(0.0);
    mesh.create_mesh_section(0, &vertices, &QUAD_INDICES, None, true, false);

    let section = mesh.mesh_section(0).unwrap();
    let stored: Vec<Vec3> = section.positions().collect();
    assert_eq!(stored, vertices);
    assert_eq!(section.index_buffer, vec![0, 1, 2, 2, 3, 0]);
    assert!(section.visible);
    assert!(!section.enable_collision);
}

#[test]
fn test_get_out_of_range_is_none() {
    let mesh = default_mesh();
    assert!(mesh.mesh_section(0).is_none());
    assert!(!mesh.section_exists(0));
}

#[test]
fn test_update_twice_is_idempotent() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);

    let moved = quad_at(3.0);
    mesh.update_mesh_section(0, &moved, &QUAD_INDICES, true);
    let once = mesh.mesh_sections().to_vec();
    let once_bounds = mesh.local_bounds();

    mesh.update_mesh_section(0, &moved, &QUAD_INDICES, true);
    assert_eq!(mesh.mesh_sections(), once.as_slice());
    assert_eq!(mesh.local_bounds(), once_bounds);
}

#[test]
fn test_bounds_contain_every_vertex() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(-4.0), &QUAD_INDICES, None, true, false);
    mesh.create_mesh_section(2, &quad_at(9.0), &QUAD_INDICES, None, false, false);

    let local_box = *mesh.local_box();
    for section in mesh.mesh_sections() {
        for position in section.positions() {
            assert!(local_box.contains_point(position));
        }
    }
    assert_eq!(local_box.min, Vec3::new(-4.0, 0.0, 0.0));
    assert_eq!(local_box.max, Vec3::new(10.0, 1.0, 0.0));
}

#[test]
fn test_empty_store_has_empty_bounds() {
    let mut mesh = default_mesh();
    assert_eq!(*mesh.local_box(), AABB::empty());

    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, false);
    mesh.clear_all_mesh_sections();
    assert_eq!(mesh.num_sections(), 0);
    assert_eq!(*mesh.local_box(), AABB::empty());
    assert!(!mesh.local_box().is_valid());
}

#[test]
fn test_unit_square_scenario() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, false);

    assert_eq!(mesh.num_sections(), 1);
    assert_eq!(*mesh.local_box(), AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0)));
    let section = mesh.mesh_section(0).unwrap();
    assert!(section.is_valid_for_rendering());
    assert_eq!(section.num_triangles(), 2);
}

#[test]
fn test_empty_geometry_is_noop() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &[], &[], None, true, false);
    assert_eq!(mesh.num_sections(), 0);

    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, false);
    mesh.create_mesh_section(0, &[], &[], None, true, false);
    assert_eq!(mesh.num_sections(), 1);
    assert_eq!(mesh.mesh_section(0).unwrap().vertex_buffer.len(), 4);
}

#[test]
fn test_remove_shifts_later_sections() {
    let mut mesh = default_mesh();
    for i in 0..3 {
        mesh.create_mesh_section(i, &quad_at(i as f32 * 10.0), &QUAD_INDICES, None, true, false);
    }

    mesh.remove_mesh_section(0);
    assert_eq!(mesh.num_sections(), 2);
    let first = mesh.mesh_section(0).unwrap();
    assert_eq!(first.positions().next(), Some(Vec3::new(10.0, 0.0, 0.0)));
    assert_eq!(mesh.local_box().min.x, 10.0);

    mesh.remove_mesh_section(5);
    assert_eq!(mesh.num_sections(), 2);
}

#[test]
fn test_degenerate_section_is_stored_but_not_renderable() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &[0, 1, 2, 3], None, true, true);

    let section = mesh.mesh_section(0).unwrap();
    assert_eq!(section.index_buffer.len(), 4);
    assert!(!section.is_valid_for_rendering());
    assert!(!mesh.contains_physics_tri_mesh_data());
}

#[test]
fn test_set_mesh_section_replaces_value() {
    let mut mesh = default_mesh();
    let mut section = crate::mesh::MeshSection::from_geometry(
        crate::mesh::section::vertices_from_positions(&quad_at(2.0)),
        vec![0, 1, 2],
    );
    section.visible = false;
    mesh.set_mesh_section(1, section);

    assert_eq!(mesh.num_sections(), 2);
    assert!(!mesh.is_section_visible(1));
    assert_eq!(mesh.local_box().min.x, 2.0);
    assert!(mesh.is_render_state_dirty());
}

#[test]
fn test_post_load_rebuilds_bounds() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    let before = mesh.body_setup().map(|b| b.geometry_id);

    mesh.post_load();
    assert_eq!(*mesh.local_box(), AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0)));
    assert_ne!(mesh.body_setup().map(|b| b.geometry_id), before);
}

fn section_with_indices(x: f32, indices: Vec<u32>) -> crate::mesh::MeshSection {
    let mut section = crate::mesh::MeshSection::from_geometry(
        crate::mesh::section::vertices_from_positions(&quad_at(x)),
        indices,
    );
    section.enable_collision = true;
    section
}

#[test]
fn test_set_mesh_section_rejects_dangling_indices() {
    let mut mesh = default_mesh();
    let result = mesh.try_set_mesh_section(0, section_with_indices(0.0, vec![0, 1, 9]));

    assert!(matches!(
        result,
        Err(MeshError::IndexOutOfRange { section: 0, position: 2, value: 9, vertex_count: 4 })
    ));
    assert_eq!(mesh.num_sections(), 0);
    assert!(!mesh.contains_physics_tri_mesh_data());
    assert!(mesh.body_setup().is_none());
    assert!(!mesh.is_render_state_dirty());
}

#[test]
fn test_set_mesh_section_with_max_index_keeps_collision() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    let body = mesh.body_setup().map(|b| b.geometry_id);

    mesh.set_mesh_section(1, section_with_indices(2.0, vec![0, 1, u32::MAX]));

    assert_eq!(mesh.num_sections(), 1);
    assert_eq!(mesh.body_setup().map(|b| b.geometry_id), body);
    assert_eq!(mesh.physics_tri_mesh_data().map(|d| d.num_triangles()), Some(2));
}

#[test]
fn test_huge_section_index_is_rejected() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(usize::MAX, &quad_at(0.0), &QUAD_INDICES, None, true, false);
    assert_eq!(mesh.num_sections(), 0);

    let result = mesh.try_create_mesh_section_u32(MAX_SECTION_INDEX + 1, &quad_at(0.0), &[0, 1, 2], None, true, false);
    assert_eq!(
        result,
        Err(MeshError::SectionIndexTooLarge { index: MAX_SECTION_INDEX + 1, max: MAX_SECTION_INDEX })
    );

    mesh.set_mesh_section(usize::MAX, section_with_indices(0.0, vec![0, 1, 2]));
    assert_eq!(mesh.num_sections(), 0);
    assert!(!mesh.is_render_state_dirty());
}
