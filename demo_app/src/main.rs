//! Plane demo
//!
//! Builds two subdivided plane sections with collision, ripples one of them
//! for a few frames, and hands every change to a render thread that owns the
//! scene proxy. Collision is cooked on a background worker.
//!
//! Usage: `plane_demo [config.toml|config.ron]`

mod plane;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use procedural_mesh::config::Config;
use procedural_mesh::physics::CollisionSyncState;
use procedural_mesh::prelude::*;
use procedural_mesh::render::RenderStateReceiver;

use plane::PlaneGrid;

const PLANE_SIZE: f32 = 100.0;
const SUBDIVISIONS: usize = 16;
const FRAMES: usize = 60;
const RIPPLE_EVERY: usize = 10;
const FRAME_TIME: Duration = Duration::from_millis(16);

/// What the render thread saw before shutting down
#[derive(Debug, Default)]
struct RenderStats {
    frames: usize,
    rebuilds: usize,
    dynamic_batches: usize,
    ray_tracing_instances: usize,
    live_buffers_at_exit: usize,
}

fn run_render_thread(receiver: RenderStateReceiver, running: Arc<AtomicBool>) -> RenderStats {
    let headless = Arc::new(HeadlessDevice::new().with_ray_tracing(true));
    let mut host = SceneProxyHost::new(headless.clone(), receiver);
    let views = [SceneView::new(ViewFamily::default())];
    let mut stats = RenderStats::default();

    loop {
        let stopping = !running.load(Ordering::Acquire);

        if host.sync() {
            if let Some(proxy) = host.proxy() {
                log::info!(
                    "Render thread: proxy generation {} ({} sections, {} static batches, {} GPU bytes)",
                    proxy.generation(),
                    proxy.sections().len(),
                    proxy.static_draw_list().len(),
                    proxy.gpu_memory_bytes()
                );
            }
        }

        if let Some(proxy) = host.proxy_mut() {
            let mut collector = MeshElementCollector::new(views.len());
            proxy.get_dynamic_mesh_elements(&views, 0b1, &mut collector);
            stats.dynamic_batches += collector.total_batches();

            let mut instances = Vec::new();
            proxy.get_dynamic_ray_tracing_instances(&mut instances);
            stats.ray_tracing_instances += instances.len();
        }

        stats.frames += 1;
        if stopping {
            break;
        }
        thread::sleep(FRAME_TIME);
    }

    stats.rebuilds = host.rebuild_count();
    drop(host);
    stats.live_buffers_at_exit = headless.live_count();
    stats
}

fn load_config() -> Result<ProceduralMeshConfig, Box<dyn std::error::Error>> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            ProceduralMeshConfig::load_from_file(&path)?
        }
        None => ProceduralMeshConfig::default(),
    };
    config.component.use_async_cooking = true;
    config.component.mobility = Mobility::Movable;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    procedural_mesh::foundation::logging::init();
    log::info!("Starting plane demo...");

    let config = load_config()?;
    let cook_service = ThreadedCookService::new(Arc::new(MeshCooker::new()));
    let collaborators = MeshCollaborators::default().with_async_cook_service(Box::new(cook_service));
    let mut mesh = ProceduralMeshComponent::with_collaborators(config, collaborators);

    let ground = Arc::new(Material::new(MaterialId(1)).with_name("Ground"));
    let water = Arc::new(Material::new(MaterialId(2)).with_name("Water"));

    let left = PlaneGrid::new(Vec3::zeros(), PLANE_SIZE, SUBDIVISIONS);
    let right = PlaneGrid::new(Vec3::new(PLANE_SIZE, 0.0, 0.0), PLANE_SIZE, SUBDIVISIONS);
    mesh.create_mesh_section(0, &left.vertices, &left.triangles, Some(ground), true, true);
    mesh.create_mesh_section(1, &right.vertices, &right.triangles, Some(water), true, true);
    log::info!(
        "Created {} sections, bounds {:?}",
        mesh.num_sections(),
        mesh.bounds().box_extent
    );

    let (publisher, receiver) = render_channel();
    let running = Arc::new(AtomicBool::new(true));
    let render_thread = {
        let running = Arc::clone(&running);
        thread::Builder::new()
            .name("render".to_string())
            .spawn(move || run_render_thread(receiver, running))?
    };

    for frame in 0..FRAMES {
        if frame > 0 && frame % RIPPLE_EVERY == 0 {
            let phase = frame as f32 * 0.1;
            let rippled = right.displaced(|x, y| ((x + y) * 0.1 + phase).sin() * 2.0);
            mesh.update_mesh_section(1, &rippled, &right.triangles, true);
        }

        let applied = mesh.process_async_cook_results();
        if applied > 0 {
            log::info!("Frame {}: applied collision, physics state {:?}", frame, mesh.physics_state());
        }
        mesh.send_render_state(&publisher);
        thread::sleep(FRAME_TIME);
    }

    while mesh.collision_state() != CollisionSyncState::Idle {
        mesh.process_async_cook_results();
        thread::sleep(FRAME_TIME);
    }
    log::info!("Collision settled: {:?}", mesh.physics_state());

    mesh.destroy_render_state(&publisher);
    running.store(false, Ordering::Release);
    let stats = render_thread
        .join()
        .map_err(|_| "render thread panicked")?;

    log::info!(
        "Render thread: {} frames, {} rebuilds, {} dynamic batches, {} ray tracing instances",
        stats.frames,
        stats.rebuilds,
        stats.dynamic_batches,
        stats.ray_tracing_instances
    );
    if stats.live_buffers_at_exit != 0 {
        log::error!("{} GPU buffers leaked", stats.live_buffers_at_exit);
    }

    log::info!("Plane demo finished");
    Ok(())
}
