//! Cross-subsystem scenarios
//!
//! Drive a whole component through the public API and check the section
//! store, bounds, collision and render output together.

mod section_store;
mod collision;

use crate::core::config::ProceduralMeshConfig;
use crate::foundation::math::Vec3;
use crate::mesh::{MeshCollaborators, ProceduralMeshComponent};
use crate::physics::DeferredCookService;

const QUAD_INDICES: [i32; 6] = [0, 1, 2, 2, 3, 0];

fn init_logging() {
    let _ = crate::foundation::logging::try_init();
}

/// Unit square in the XY plane, offset along X
fn quad_at(x: f32) -> Vec<Vec3> {
    vec![
        Vec3::new(x, 0.0, 0.0),
        Vec3::new(x + 1.0, 0.0, 0.0),
        Vec3::new(x + 1.0, 1.0, 0.0),
        Vec3::new(x, 1.0, 0.0),
    ]
}

fn default_mesh() -> ProceduralMeshComponent {
    init_logging();
    ProceduralMeshComponent::new(ProceduralMeshConfig::default())
}

fn async_mesh(service: &DeferredCookService) -> ProceduralMeshComponent {
    init_logging();
    let mut config = ProceduralMeshConfig::default();
    config.component.use_async_cooking = true;
    let collaborators = MeshCollaborators::default().with_async_cook_service(Box::new(service.clone()));
    ProceduralMeshComponent::with_collaborators(config, collaborators)
}
