//! Collision merge and async cook ordering

use std::sync::{Arc, Mutex};

use super::*;
use crate::physics::{
    BodySetup,
    CollisionDataProvider,
    CollisionSyncState,
    CollisionTraceFlag,
    CookError,
    CookTicket,
    GeometryId,
    MeshCooker,
    PhysicsScene,
};

fn latest_ticket(service: &DeferredCookService) -> CookTicket {
    *service.pending_tickets().last().unwrap()
}

/// Submit a cook for a quad at `x` and mark it started so it cannot be aborted
fn submit_started(mesh: &mut ProceduralMeshComponent, service: &DeferredCookService, x: f32) -> (CookTicket, GeometryId) {
    mesh.update_mesh_section(0, &quad_at(x), &QUAD_INDICES, true);
    let ticket = latest_ticket(service);
    let geometry_id = service.pending_setup(ticket).unwrap().geometry_id;
    assert!(service.start(ticket));
    (ticket, geometry_id)
}

fn cooked_min_x(mesh: &ProceduralMeshComponent) -> f32 {
    let body = mesh.body_setup().unwrap();
    body.cooked.as_ref().unwrap().tri_mesh.as_ref().unwrap().bounds.min.x
}

#[test]
fn test_merge_counts_only_collision_sections() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    mesh.create_mesh_section(1, &quad_at(2.0), &QUAD_INDICES, None, true, false);
    mesh.create_mesh_section(2, &quad_at(4.0)[..3], &[0, 1, 2], None, true, true);

    let data = mesh.physics_tri_mesh_data().unwrap();
    assert_eq!(data.vertices.len(), 4 + 3);
    assert_eq!(data.num_triangles(), (6 + 3) / 3);
    assert_eq!(data.material_indices, vec![0, 0, 2]);
    assert_eq!(data.indices[2], [4, 5, 6]);
    assert_eq!(mesh.tri_mesh_size_estimates().vertices, 7);
    assert!(!mesh.wants_neg_x_tri_mesh());
}

#[test]
fn test_sync_cook_installs_double_sided_body() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);

    let body = mesh.body_setup().unwrap();
    assert!(body.is_cooked());
    assert!(body.double_sided_geometry);
    assert!(!body.generate_mirrored_collision);
    assert_eq!(body.trace_flag, CollisionTraceFlag::UseComplexAsSimple);
    assert_eq!(mesh.physics_state().recreate_count, 1);
}

#[test]
fn test_create_without_collision_does_not_cook() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, false);
    assert!(mesh.body_setup().is_none());
    assert!(!mesh.contains_physics_tri_mesh_data());
}

#[test]
fn test_replacing_collision_section_without_collision_resyncs() {
    let mut mesh = default_mesh();
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, false);

    let body = mesh.body_setup().unwrap();
    assert!(body.tri_mesh.is_none());
    assert_eq!(mesh.physics_state().recreate_count, 2);
}

#[test]
fn test_hull_with_three_points_is_rejected() {
    let mut mesh = default_mesh();
    mesh.add_collision_convex_mesh(&[Vec3::zeros(), Vec3::x(), Vec3::y()]);
    assert!(mesh.collision_convex_elems().is_empty());
    assert!(mesh.body_setup().is_none());
}

#[test]
fn test_hull_management() {
    let mut mesh = default_mesh();
    let tetra = vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()];

    mesh.add_collision_convex_mesh(&tetra);
    assert_eq!(mesh.collision_convex_elems().len(), 1);
    assert_eq!(mesh.body_setup().unwrap().agg_geom.convex_elems.len(), 1);

    mesh.set_collision_convex_meshes(&[tetra.clone(), tetra[..2].to_vec(), tetra.clone()]);
    assert_eq!(mesh.collision_convex_elems().len(), 2);

    mesh.clear_collision_convex_meshes();
    assert!(mesh.collision_convex_elems().is_empty());
    assert!(mesh.body_setup().unwrap().agg_geom.is_empty());
}

#[test]
fn test_async_staleness_newest_success_wins() {
    let service = DeferredCookService::new();
    let mut mesh = async_mesh(&service);
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    assert!(service.start(latest_ticket(&service)));
    // Clear out the create cook so the three below are the only ones in flight.
    service.complete_all(&MeshCooker::new());
    mesh.process_async_cook_results();

    let (q1, _) = submit_started(&mut mesh, &service, 1.0);
    let (q2, _) = submit_started(&mut mesh, &service, 2.0);
    let (q3, q3_geometry) = submit_started(&mut mesh, &service, 3.0);
    assert_eq!(mesh.collision_state(), CollisionSyncState::CookingAsync { pending: 3 });

    service.complete(q1, &MeshCooker::new());
    assert_eq!(mesh.process_async_cook_results(), 1);
    assert_eq!(cooked_min_x(&mesh), 1.0);

    service.complete(q3, &MeshCooker::new());
    assert_eq!(mesh.process_async_cook_results(), 1);

    service.fail(q2, CookError::WorkerDisconnected);
    assert_eq!(mesh.process_async_cook_results(), 0);

    assert_eq!(mesh.body_setup().unwrap().geometry_id, q3_geometry);
    assert_eq!(cooked_min_x(&mesh), 3.0);
    assert_eq!(mesh.collision_state(), CollisionSyncState::Idle);
}

#[test]
fn test_async_late_older_success_is_ignored() {
    let service = DeferredCookService::new();
    let mut mesh = async_mesh(&service);
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    let q0 = latest_ticket(&service);
    assert!(service.start(q0));
    let (q1, q1_geometry) = submit_started(&mut mesh, &service, 5.0);

    service.complete(q1, &MeshCooker::new());
    service.complete(q0, &MeshCooker::new());
    assert_eq!(mesh.process_async_cook_results(), 1);

    assert_eq!(mesh.body_setup().unwrap().geometry_id, q1_geometry);
    assert_eq!(mesh.physics_state().recreate_count, 1);
}

#[test]
fn test_async_queued_request_is_aborted_by_newer() {
    let service = DeferredCookService::new();
    let mut mesh = async_mesh(&service);
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    mesh.update_mesh_section(0, &quad_at(1.0), &QUAD_INDICES, true);

    assert_eq!(service.aborted_count(), 1);
    assert_eq!(service.pending_tickets().len(), 1);
    assert_eq!(mesh.collision_state(), CollisionSyncState::CookingAsync { pending: 1 });
}

#[test]
fn test_async_failure_keeps_authoritative_body() {
    let service = DeferredCookService::new();
    let mut mesh = async_mesh(&service);
    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    service.complete_all(&MeshCooker::new());
    mesh.process_async_cook_results();
    let installed = mesh.body_setup().unwrap().geometry_id;

    mesh.update_mesh_section(0, &quad_at(1.0), &QUAD_INDICES, true);
    service.fail(latest_ticket(&service), CookError::WorkerDisconnected);
    assert_eq!(mesh.process_async_cook_results(), 0);

    assert_eq!(mesh.body_setup().unwrap().geometry_id, installed);
    assert_eq!(mesh.collision_state(), CollisionSyncState::Idle);
}

#[derive(Clone, Default)]
struct RecordingScene {
    recreated: Arc<Mutex<Vec<GeometryId>>>,
}

impl PhysicsScene for RecordingScene {
    fn recreate_body(&mut self, setup: &Arc<BodySetup>) {
        self.recreated.lock().unwrap().push(setup.geometry_id);
    }
}

#[test]
fn test_physics_scene_sees_each_installed_body() {
    let scene = RecordingScene::default();
    let collaborators = MeshCollaborators::default().with_physics_scene(Box::new(scene.clone()));
    let mut mesh = ProceduralMeshComponent::with_collaborators(ProceduralMeshConfig::default(), collaborators);

    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);
    mesh.update_mesh_section(0, &quad_at(1.0), &QUAD_INDICES, true);

    let recreated = scene.recreated.lock().unwrap();
    assert_eq!(recreated.len(), 2);
    assert_eq!(Some(recreated[1]), mesh.body_setup().map(|b| b.geometry_id));
}

#[test]
fn test_threaded_service_end_to_end() {
    use std::time::{Duration, Instant};

    init_logging();
    let mut config = ProceduralMeshConfig::default();
    config.component.use_async_cooking = true;
    let service = crate::physics::ThreadedCookService::new(Arc::new(MeshCooker::new()));
    let collaborators = MeshCollaborators::default().with_async_cook_service(Box::new(service));
    let mut mesh = ProceduralMeshComponent::with_collaborators(config, collaborators);

    mesh.create_mesh_section(0, &quad_at(0.0), &QUAD_INDICES, None, true, true);

    let deadline = Instant::now() + Duration::from_secs(5);
    while mesh.body_setup().is_none() && Instant::now() < deadline {
        mesh.process_async_cook_results();
        std::thread::sleep(Duration::from_millis(1));
    }

    assert!(mesh.body_setup().unwrap().is_cooked());
    assert_eq!(mesh.collision_state(), CollisionSyncState::Idle);
}
